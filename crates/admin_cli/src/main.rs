use std::error::Error;

use clap::{Args, Parser, Subcommand};
use engine::{Engine, MembershipRole, Money, NewProductCmd, TaxRate};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

#[derive(Parser, Debug)]
#[command(name = "order_desk_admin")]
#[command(about = "Admin utilities for the order desk (bootstrap tenants, members, catalog)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./order_desk.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Org(Org),
    Member(Member),
    Product(Product),
}

#[derive(Args, Debug)]
struct Org {
    #[command(subcommand)]
    command: OrgCommand,
}

#[derive(Subcommand, Debug)]
enum OrgCommand {
    /// Create an organization and its first owner.
    Create(OrgCreateArgs),
    Deactivate(OrgIdArgs),
    Activate(OrgIdArgs),
}

#[derive(Args, Debug)]
struct OrgCreateArgs {
    #[arg(long)]
    name: String,
    /// User id of the owner.
    #[arg(long)]
    owner: i64,
}

#[derive(Args, Debug)]
struct OrgIdArgs {
    #[arg(long)]
    id: i64,
}

#[derive(Args, Debug)]
struct Member {
    #[command(subcommand)]
    command: MemberCommand,
}

#[derive(Subcommand, Debug)]
enum MemberCommand {
    Add(MemberAddArgs),
}

#[derive(Args, Debug)]
struct MemberAddArgs {
    #[arg(long)]
    org: i64,
    #[arg(long)]
    user: i64,
    #[arg(long, value_parser = parse_role, default_value = "member")]
    role: MembershipRole,
    /// Owner or admin performing the change.
    #[arg(long)]
    actor: i64,
}

#[derive(Args, Debug)]
struct Product {
    #[command(subcommand)]
    command: ProductCommand,
}

#[derive(Subcommand, Debug)]
enum ProductCommand {
    Create(ProductCreateArgs),
}

#[derive(Args, Debug)]
struct ProductCreateArgs {
    #[arg(long)]
    org: i64,
    #[arg(long)]
    actor: i64,
    #[arg(long)]
    sku: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    category: Option<String>,
    /// Unit price, e.g. `12.50`.
    #[arg(long, value_parser = parse_money)]
    price: Money,
    /// Tax rate in basis points (`1800` = 18 %).
    #[arg(long, default_value_t = 0)]
    tax_bp: i32,
    #[arg(long, default_value_t = 0)]
    stock: i64,
    #[arg(long, default_value_t = 0)]
    reorder_level: i64,
}

fn parse_role(raw: &str) -> Result<MembershipRole, String> {
    MembershipRole::try_from(raw.to_ascii_lowercase().as_str()).map_err(|err| err.to_string())
}

fn parse_money(raw: &str) -> Result<Money, String> {
    raw.parse::<Money>().map_err(|err| err.to_string())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter("engine=warn")
        .with_writer(std::io::stderr)
        .init();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::Org(Org {
            command: OrgCommand::Create(args),
        }) => {
            let org = engine.create_organization(&args.name, args.owner).await?;
            println!("created organization: {} ({})", org.name, org.id);
        }
        Command::Org(Org {
            command: OrgCommand::Deactivate(args),
        }) => {
            let org = engine.set_organization_active(args.id, false).await?;
            println!("deactivated organization: {} ({})", org.name, org.id);
        }
        Command::Org(Org {
            command: OrgCommand::Activate(args),
        }) => {
            let org = engine.set_organization_active(args.id, true).await?;
            println!("activated organization: {} ({})", org.name, org.id);
        }
        Command::Member(Member {
            command: MemberCommand::Add(args),
        }) => {
            let ctx = engine.authorize_id(args.actor, args.org).await?;
            let membership = engine.add_member(&ctx, args.user, args.role).await?;
            println!(
                "user {} is now {} of organization {}",
                membership.user_id,
                membership.role.as_str(),
                membership.organization_id
            );
        }
        Command::Product(Product {
            command: ProductCommand::Create(args),
        }) => {
            let ctx = engine.authorize_id(args.actor, args.org).await?;
            let mut cmd = NewProductCmd::new(&args.sku, &args.name, args.price)
                .tax_rate(TaxRate::from_basis_points(args.tax_bp)?)
                .stock_quantity(args.stock)
                .reorder_level(args.reorder_level);
            if let Some(category) = args.category {
                cmd = cmd.category(category);
            }

            let product = engine.create_product(&ctx, cmd).await?;
            println!(
                "created product: {} {} @ {} ({})",
                product.sku, product.name, product.unit_price, product.id
            );
        }
    }

    Ok(())
}
