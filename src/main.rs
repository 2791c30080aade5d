// Archivo: main.rs
// Propósito: binario `todo`. Parsea la línea de comandos, configura el
// logging en stderr y traduce los errores a códigos de salida
// (1 = error de uso, 2 = fallo de almacenamiento o interno).
mod cli;
mod commands;
mod render;

use clap::Parser;
use cli::Cli;
use idm::IdmError;
use std::process::ExitCode;
use todo_domain::DomainError;
use todo_persistence::StoreError;
use todo_workflow::WorkflowError;
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    // `try_init` también instala el puente para los registros de `log`.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Busca en la cadena de causas el primer error de dominio conocido.
fn is_user_error(err: &anyhow::Error) -> bool {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<WorkflowError>() {
            return e.is_user_error();
        }
        if let Some(e) = cause.downcast_ref::<StoreError>() {
            return e.is_user_error();
        }
        if let Some(e) = cause.downcast_ref::<IdmError>() {
            return e.is_user_error();
        }
        if let Some(e) = cause.downcast_ref::<DomainError>() {
            return matches!(e, DomainError::ValidationError(_));
        }
    }
    false
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = cli.store_config()
                    .and_then(|config| commands::execute(config, &cli.command, cli.context.as_deref()));
    match result {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::debug!("command failed: {:?}", err);
            eprintln!("error: {:#}", err);
            if is_user_error(&err) {
                ExitCode::from(1)
            } else {
                ExitCode::from(2)
            }
        }
    }
}
