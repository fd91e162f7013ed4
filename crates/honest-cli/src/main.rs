// Command line driver for the Honest card exchange client

// Offline commands expose the field codec so stored values can be checked
// against the contract by hand. Network commands read and write the
// HonestCard contract over JSON-RPC.

mod logging;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{bail, eyre, Result};
use ethers::{
    middleware::SignerMiddleware,
    providers::{Http, Provider},
    signers::{LocalWallet, Signer},
    types::{Address, U256},
    utils::hex,
};
use honest_card::{
    codec::{self, FieldKind},
    config::AppConfig,
    contract::{CardContract, EthersCardContract},
    exchange::{short_address, ExchangeOverview},
    notify::{Notice, Notifier, Severity},
    CardClient,
};
use tracing_subscriber::filter::LevelFilter;

// Helper function to render an encoded field as a hex-encoded 32 byte word
fn word_to_string(value: U256) -> String {
    let mut word = [0u8; 32];
    value.to_big_endian(&mut word);
    format!("0x{}", hex::encode(word))
}

// Accepts decimal or 0x-prefixed hex
fn parse_uint(value: &str) -> Result<U256> {
    let parsed = match value.strip_prefix("0x") {
        Some(digits) => U256::from_str_radix(digits, 16).ok(),
        None => U256::from_dec_str(value).ok(),
    };
    parsed.ok_or_else(|| eyre!("{value} is not a decimal or 0x-hex integer"))
}

// CLI struct and subcommands
#[derive(Parser, Debug)]
#[clap(name = "honest")]
struct Cli {
    /// TOML file read before HONEST_* environment variables
    #[arg(long, global = true, value_name = "path")]
    config: Option<PathBuf>,
    /// Key of the connected account, required for writes
    #[arg(long, global = true, env = "HONEST_PRIVATE_KEY", hide_env_values = true)]
    private_key: Option<String>,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Field {
    Gender,
    Phone,
    FullName,
    SocialId,
    Location,
}

impl From<Field> for FieldKind {
    fn from(field: Field) -> Self {
        match field {
            Field::Gender => FieldKind::Gender,
            Field::Phone => FieldKind::Phone,
            Field::FullName => FieldKind::FullName,
            Field::SocialId => FieldKind::SocialId,
            Field::Location => FieldKind::Location,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[clap(name = "encode")]
    Encode {
        #[arg(value_enum, value_name = "field")]
        field: Field,
        #[arg(value_name = "value")]
        value: String,
        /// Only used for the phone field
        #[arg(long, default_value = "+86")]
        country_code: String,
    },
    #[clap(name = "decode")]
    Decode {
        #[arg(value_enum, value_name = "field")]
        field: Field,
        #[arg(value_name = "value")]
        value: String,
    },
    /// Card and exchange sets of an address (defaults to the own account)
    Status {
        #[arg(long, value_name = "address")]
        address: Option<Address>,
    },
    RequestExchange {
        #[arg(value_name = "target")]
        target: String,
    },
    /// Answer an incoming exchange request
    Accept {
        #[arg(value_name = "from")]
        from: Address,
    },
    /// Public part of a card and our relation to its owner
    View {
        #[arg(value_name = "address")]
        address: Address,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    logging::init_from_env_or(LevelFilter::INFO)?;

    let args = Cli::parse();
    match args.command {
        Commands::Encode {
            field,
            value,
            country_code,
        } => {
            let kind = FieldKind::from(field);
            let encoded = match kind {
                FieldKind::Phone => codec::encode_phone(&country_code, &value)?,
                _ => codec::encode(kind, &value)?,
            };
            println!("{}", word_to_string(encoded));
        }
        Commands::Decode { field, value } => {
            let value = parse_uint(&value)?;
            println!("{}", codec::decode(field.into(), value));
        }
        command => {
            let config = AppConfig::load(args.config.as_deref())?;
            let provider = Provider::<Http>::try_from(config.rpc_url.as_str())?;
            match args.private_key {
                Some(key) => {
                    let wallet = key.parse::<LocalWallet>()?.with_chain_id(config.chain_id);
                    let middleware = SignerMiddleware::new(provider, wallet.clone());
                    let contract =
                        EthersCardContract::new(config.contract_address, Arc::new(middleware));
                    let mut client = CardClient::new(contract, config.contract_address);
                    client
                        .session_mut()
                        .connect_wallet(Arc::new(wallet), config.chain_id);
                    dispatch(&client, &config, command).await?;
                }
                None => {
                    let contract =
                        EthersCardContract::new(config.contract_address, Arc::new(provider));
                    let client = CardClient::new(contract, config.contract_address);
                    dispatch(&client, &config, command).await?;
                }
            }
        }
    }

    Ok(())
}

async fn dispatch<C: CardContract>(
    client: &CardClient<C>,
    config: &AppConfig,
    command: Commands,
) -> Result<()> {
    let mut notifier = Notifier::new(config.notice_duration);
    let me = client.session().get().ok().map(|session| session.account());
    match command {
        Commands::Status { address } => {
            let Some(user) = address.or(me) else {
                bail!("pass --address or set HONEST_PRIVATE_KEY");
            };
            if client.has_card(user).await? {
                let info = client.public_info(user).await?;
                println!("card: {} ({user:?})", display_surname(&info.surname));
            } else {
                println!("card: none ({user:?})");
            }
            print_overview(&client.overview(user).await?);
        }
        Commands::RequestExchange { target } => {
            let result = client.request_exchange(&target).await;
            finish(
                notifier.report(&result, "Exchange request sent!", "Failed to request exchange"),
            )?;
            if let Ok(overview) = result {
                print_overview(&overview);
            }
        }
        Commands::Accept { from } => {
            let result = client.accept(from).await;
            finish(notifier.report(&result, "Exchange accepted!", "Failed to accept request"))?;
            if let Ok(overview) = result {
                print_overview(&overview);
            }
        }
        Commands::View { address } => {
            let info = client.public_info(address).await?;
            if !info.exists {
                bail!("{address:?} has not created a card");
            }
            println!("surname: {}", display_surname(&info.surname));
            if let Some(me) = me {
                let state = client.overview(me).await?.state_with(address);
                println!("exchange: {state:?}");
            }
        }
        Commands::Encode { .. } | Commands::Decode { .. } => {}
    }
    Ok(())
}

fn display_surname(surname: &str) -> &str {
    if surname.is_empty() {
        codec::PLACEHOLDER
    } else {
        surname
    }
}

fn finish(notice: &Notice) -> Result<()> {
    match notice.severity {
        Severity::Error => Err(eyre!(notice.message.clone())),
        Severity::Success | Severity::Notice => {
            println!("{}", notice.message);
            Ok(())
        }
    }
}

fn print_overview(overview: &ExchangeOverview) {
    let list = |addresses: &[Address]| {
        addresses
            .iter()
            .map(short_address)
            .collect::<Vec<_>>()
            .join(", ")
    };
    println!("outgoing: [{}]", list(&overview.outgoing));
    println!("incoming: [{}]", list(&overview.incoming));
    println!("connections: [{}]", list(&overview.connections));
}
