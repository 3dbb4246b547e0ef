use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "btorir-translate", version, about = "BTOR IR translation driver")]
pub struct CliArgs {
    /// Input file, or `-` for stdin
    #[arg(default_value = "-")]
    pub input: PathBuf,

    /// Output file, or `-` for stdout
    #[arg(short, long, default_value = "-")]
    pub output: PathBuf,

    /// Translation to perform (see --list-translations)
    #[arg(short, long)]
    pub translation: Option<String>,

    /// List the registered translations and exit
    #[arg(long, default_value_t = false)]
    pub list_translations: bool,

    /// Skip verification of the module on the IR side of the translation
    #[arg(long, default_value_t = false)]
    pub no_verify: bool,

    /// Enable logging
    #[arg(long, default_value_t = false)]
    pub log: bool,
}
