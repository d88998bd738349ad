use clap::{ArgAction, Args, Parser, Subcommand};
use mailprobe_lib::{DEFAULT_TIMEOUT_MS, SMTP_PORT, VerifyOptions};

#[derive(Parser)]
#[command(name = "mailprobe-cli", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Option<Commands>,

    /// lit des adresses depuis stdin (une par ligne)
    #[arg(long)]
    pub stdin: bool,

    /// nombre de vérifications simultanées avec --stdin
    #[arg(long, default_value_t = 4)]
    pub concurrency: usize,

    /// write report to file (JSON/NDJSON/CSV selon --format)
    #[arg(long, global = true)]
    pub out: Option<String>,

    /// format: human|json|ndjson|csv
    #[arg(long, default_value = "human", global = true)]
    pub format: String,

    /// verbosité des logs (-v, -vv); RUST_LOG a priorité
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(flatten)]
    pub probe: ProbeArgs,
}

#[derive(Subcommand)]
pub enum Commands {
    /// teste la délivrabilité SMTP d'une adresse (HELO / MAIL FROM / RCPT TO)
    Verify {
        /// adresse e-mail à tester
        email: String,
    },
    /// affiche les MX d'un domaine dans l'ordre de préférence
    Mx {
        domain: String,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ProbeArgs {
    /// enveloppe MAIL FROM (par défaut l'adresse testée)
    #[arg(long, global = true)]
    pub from: Option<String>,

    /// nom utilisé pour HELO (par défaut le domaine de l'expéditeur)
    #[arg(long, global = true)]
    pub helo: Option<String>,

    /// budget par MX, de la connexion à la réponse RCPT TO (ms)
    #[arg(long = "timeout", default_value_t = DEFAULT_TIMEOUT_MS, global = true)]
    pub timeout_ms: u64,

    /// port SMTP
    #[arg(long, default_value_t = SMTP_PORT, global = true)]
    pub port: u16,

    /// conserve le détail de chaque MX essayé
    #[arg(long, global = true)]
    pub attempts: bool,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn clap_command() -> clap::Command {
        <Self as clap::CommandFactory>::command()
    }
}

impl ProbeArgs {
    pub fn verify_options(&self) -> VerifyOptions {
        VerifyOptions {
            from: self.from.clone(),
            helo_host: self.helo.clone(),
            timeout_ms: self.timeout_ms,
            port: self.port,
            collect_attempts: self.attempts,
        }
    }
}
