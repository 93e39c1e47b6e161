use anyhow::anyhow;
use futures_util::future::join_all;
use registrar::app::App;
use registrar::application_port::*;
use registrar::logger::*;
use registrar::settings::*;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logger = Logger::new_bootstrap();

    let project_settings = parse_settings(cli.settings.as_deref())?;
    info!(?project_settings);
    logger.reload_from_config(&LogConfig::from(&project_settings.log))?;

    let app = App::try_new(&project_settings).await?;

    let result = match cli.command {
        Command::Register { names, mail } => {
            register_all(app.registration_service.clone(), names, mail).await
        }
    };

    app.shutdown().await;
    result
}

/// One task per name, so the registrations race each other like independent
/// requests would.
async fn register_all(
    service: Arc<dyn RegistrationService>,
    names: Vec<String>,
    mail: Option<String>,
) -> anyhow::Result<()> {
    let handles = names.into_iter().map(|name| {
        let service = service.clone();
        let input = RegisterInput {
            name: name.clone(),
            mail: mail.clone(),
        };
        tokio::spawn(async move { (name, service.register(input).await) })
    });

    let mut rejected = 0;
    for joined in join_all(handles).await {
        let (name, outcome) = joined?;
        match outcome {
            Ok(user_id) => println!("{name}\tregistered\t{user_id}"),
            Err(e) => {
                rejected += 1;
                println!("{name}\trejected\t{e}");
            }
        }
    }

    if rejected > 0 {
        return Err(anyhow!("{} registration(s) rejected", rejected));
    }
    Ok(())
}
