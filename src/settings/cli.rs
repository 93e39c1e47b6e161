use super::Parser;
use clap::Subcommand;

#[derive(Parser, Debug)]
#[command(name = "registrar", version, about = "Register users with store-enforced uniqueness")]
pub struct Cli {
    #[arg(long)]
    pub settings: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Register each name concurrently, one transaction per name.
    Register {
        #[arg(required = true)]
        names: Vec<String>,

        #[arg(long)]
        mail: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_register_with_several_names() {
        let cli = Cli::try_parse_from([
            "registrar",
            "--settings",
            "settings/dev.toml",
            "register",
            "alice",
            "bob",
            "--mail",
            "team@example.com",
        ])
        .unwrap();

        assert_eq!(cli.settings.as_deref(), Some("settings/dev.toml"));
        let Command::Register { names, mail } = cli.command;
        assert_eq!(names, vec!["alice", "bob"]);
        assert_eq!(mail.as_deref(), Some("team@example.com"));
    }

    #[test]
    fn register_needs_a_name() {
        assert!(Cli::try_parse_from(["registrar", "register"]).is_err());
    }
}
