use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use tracing::info;

use btorir::translate::{self, Translation, apply_translation};

use super::args::CliArgs;
use super::errors::AppError;

fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn read_input(path: &Path) -> Result<String, AppError> {
    if is_stdio(path) {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn write_output(path: &Path, text: &str) -> Result<(), AppError> {
    if is_stdio(path) {
        std::io::stdout().write_all(text.as_bytes())?;
    } else {
        fs::write(path, text)?;
    }
    Ok(())
}

fn selected_translation(args: &CliArgs) -> Result<Translation, AppError> {
    let name = args.translation.as_deref().ok_or(AppError::MissingArgument {
        arg: "--translation".to_string(),
    })?;
    translate::lookup(name)
        .ok_or_else(|| btorir::Error::UnknownTranslation {
            name: name.to_string(),
        })
        .map_err(AppError::from)
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.log {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    }

    if args.list_translations {
        for translation in translate::translations() {
            println!("{:<16} {}", translation.name, translation.description);
        }
        return Ok(());
    }

    let translation = selected_translation(&args)?;
    info!(
        "Running translation {} over {:?}",
        translation.name, args.input
    );

    let input = read_input(&args.input)?;
    let output = apply_translation(&translation, &input, !args.no_verify)
        .map_err(AppError::from)?;
    write_output(&args.output, &output)?;

    info!("Successfully translated: {:?} -> {:?}", args.input, args.output);
    Ok(())
}
