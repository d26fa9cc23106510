//! `authentik` command-line client.
//!
//! Offline helpers for the record codec and address derivation, plus a
//! `demo` command that runs the full workflow against an in-process ledger.

use std::path::PathBuf;
use std::process::ExitCode;

use authentik_client::{
    decode, encode, register_uri, run, AccountRecord, ClientConfig, ClientContext, ClientError,
    Keypair, MemoryLedger, RecordLayout,
};
use authentik_sol::{
    address_to_bytes, bytes_to_address, derive_account_address, derive_associated_token_address,
};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "authentik")]
#[command(about = "Authentik NFT record client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive the record account address for a base key, seed and program
    Derive {
        #[arg(long)]
        base: String,
        #[arg(long, default_value = "lollll")]
        seed: String,
        #[arg(long)]
        program: String,
        /// Also print the base wallet's token account for this mint
        #[arg(long)]
        mint: Option<String>,
    },
    /// Print the account space to reserve for a URI
    Plan {
        #[arg(long)]
        uri: String,
        #[command(flatten)]
        layout: LayoutArgs,
    },
    /// Encode a record and print it as hex
    Encode {
        #[arg(long)]
        uri: String,
        /// Base58 mint; implies the mint layout
        #[arg(long)]
        mint: Option<String>,
        #[arg(long, default_value_t = authentik_record::DEFAULT_MAX_URI_LEN)]
        max_uri_len: usize,
    },
    /// Decode hex account data into a record
    Decode {
        data: String,
        #[command(flatten)]
        layout: LayoutArgs,
    },
    /// Run the full workflow against an in-process ledger
    Demo {
        /// JSON config file
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value = "https://www.youtube.com/watch?v=dQw4w9WgXcQ")]
        uri: String,
        /// Base58 mint; implies the mint layout
        #[arg(long)]
        mint: Option<String>,
        #[arg(long)]
        seed: Option<String>,
    },
}

#[derive(Args)]
struct LayoutArgs {
    #[arg(long, default_value_t = authentik_record::DEFAULT_MAX_URI_LEN)]
    max_uri_len: usize,
    #[arg(long)]
    with_mint: bool,
}

impl LayoutArgs {
    fn layout(&self) -> RecordLayout {
        RecordLayout {
            max_uri_len: self.max_uri_len,
            with_mint: self.with_mint,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match execute(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn execute(command: Commands) -> Result<(), ClientError> {
    match command {
        Commands::Derive {
            base,
            seed,
            program,
            mint,
        } => {
            let base = address_to_bytes(&base)?;
            let program = address_to_bytes(&program)?;
            let derived = derive_account_address(&base, &seed, &program)?;
            println!("address: {derived}");
            if let Some(mint) = mint {
                let mint = address_to_bytes(&mint)?;
                let ata = derive_associated_token_address(&base, &mint)?;
                println!("token account: {}", bytes_to_address(&ata));
            }
        }
        Commands::Plan { uri, layout } => {
            let plan = register_uri(&uri, &layout.layout())?;
            println!("uri length: {}", plan.uri_len);
            println!("space: {}", plan.space);
        }
        Commands::Encode {
            uri,
            mint,
            max_uri_len,
        } => {
            let (record, layout) = record_and_layout(uri, mint.as_deref(), max_uri_len)?;
            println!("{}", hex::encode(encode(&record, &layout)?));
        }
        Commands::Decode { data, layout } => {
            let bytes = hex::decode(data.trim_start_matches("0x"))
                .map_err(|e| ClientError::Config(format!("data is not hex: {e}")))?;
            print_record(&decode(&bytes, &layout.layout())?);
        }
        Commands::Demo {
            config,
            uri,
            mint,
            seed,
        } => demo(config, uri, mint, seed)?,
    }
    Ok(())
}

fn demo(
    config_path: Option<PathBuf>,
    uri: String,
    mint: Option<String>,
    seed: Option<String>,
) -> Result<(), ClientError> {
    let mut config = match config_path {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };
    if let Some(seed) = seed {
        config.account_seed = seed;
    }
    let (record, layout) = record_and_layout(uri, mint.as_deref(), config.max_uri_len)?;
    config.with_mint = layout.with_mint;

    let ledger = MemoryLedger::new();
    let program_id = match config.program_id() {
        Ok(id) => id,
        Err(_) => {
            let id = Keypair::generate().pubkey();
            config.program_id = Some(bytes_to_address(&id));
            id
        }
    };
    ledger.deploy_program(program_id)?;

    let ctx = ClientContext::from_config(&ledger, &config)?;
    let report = run(&ctx, &record)?;

    println!("program: {}", bytes_to_address(&program_id));
    println!("payer: {}", bytes_to_address(&ctx.payer_address()));
    println!("account: {} ({:?})", report.account, report.state);
    println!("space: {}", report.plan.space);
    println!("signature: {}", report.signature);
    if let Some(ata) = report.token_account {
        println!("token account: {}", bytes_to_address(&ata));
    }
    print_record(&report.record);
    Ok(())
}

fn record_and_layout(
    uri: String,
    mint: Option<&str>,
    max_uri_len: usize,
) -> Result<(AccountRecord, RecordLayout), ClientError> {
    Ok(match mint {
        Some(mint) => (
            AccountRecord::with_mint(uri, address_to_bytes(mint)?),
            RecordLayout::with_mint(max_uri_len),
        ),
        None => (AccountRecord::new(uri), RecordLayout::uri_only(max_uri_len)),
    })
}

fn print_record(record: &AccountRecord) {
    println!("uri: {}", record.uri);
    if let Some(mint) = record.mint {
        println!("mint: {}", bytes_to_address(&mint));
    }
}
