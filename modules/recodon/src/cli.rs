use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::codon::{CleavageSpec, Codon};
use crate::consts::{DEFAULT_CLEAVAGE, DEFAULT_CODON};

#[derive(Debug, Parser)]
#[command(
    name = "recodon",
    about = "Combinatorial codon translation databases and PSM reconciliation",
    version = env!("CARGO_PKG_VERSION")
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        short = 'L',
        long = "level",
        help = "Logging level",
        value_name = "LEVEL",
        default_value_t = log::Level::Info,
    )]
    pub level: log::Level,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build a search database translating one codon into every amino acid
    Database(DatabaseArgs),

    /// Place search engine matches on their cDNA and add fragment-ion support
    Combine(CombineArgs),

    /// Summarize codon translations found in a combined table
    Stats(StatsArgs),
}

#[derive(Debug, Parser)]
pub struct DatabaseArgs {
    #[arg(
        short = 'i',
        long = "input",
        required = true,
        help = "Path to cDNA .fa file"
    )]
    pub cdna: PathBuf,

    #[arg(
        short = 'o',
        long = "output",
        required = true,
        help = "Path to output protein database .fa file"
    )]
    pub output: PathBuf,

    #[arg(
        short = 'm',
        long = "map",
        required = true,
        help = "Path to output header map"
    )]
    pub map: PathBuf,

    #[arg(
        short = 'c',
        long = "codon",
        required = false,
        help = "Codon translated into every amino acid",
        default_value = DEFAULT_CODON
    )]
    pub codon: Codon,

    #[arg(
        long = "ile",
        help = "Also translate the codon into isoleucine",
        action = clap::ArgAction::SetTrue
    )]
    pub ile: bool,

    #[arg(
        long = "cleavage",
        required = false,
        help = "Comma-separated residues after which the protease cleaves",
        default_value = DEFAULT_CLEAVAGE
    )]
    pub cleavage: CleavageSpec,
}

#[derive(Debug, Parser)]
pub struct CombineArgs {
    #[arg(
        short = 'e',
        long = "evidence",
        required = true,
        help = "Path to evidence table"
    )]
    pub evidence: PathBuf,

    #[arg(
        short = 'm',
        long = "msms",
        required = true,
        help = "Path to msms table"
    )]
    pub msms: PathBuf,

    #[arg(
        long = "cdna",
        required = true,
        help = "Path to cDNA .fa file used to build the database"
    )]
    pub cdna: PathBuf,

    #[arg(
        long = "map",
        required = true,
        help = "Path to header map written with the database"
    )]
    pub map: PathBuf,

    #[arg(
        short = 'o',
        long = "output",
        required = true,
        help = "Path to output combined table"
    )]
    pub output: PathBuf,

    #[arg(
        short = 'c',
        long = "codon",
        required = false,
        help = "Codon translated into every amino acid",
        default_value = DEFAULT_CODON
    )]
    pub codon: Codon,
}

#[derive(Debug, Parser)]
pub struct StatsArgs {
    #[arg(
        short = 'i',
        long = "input",
        required = true,
        help = "Path to combined table"
    )]
    pub input: PathBuf,

    #[arg(
        long = "cdna",
        required = true,
        help = "Path to cDNA .fa file used to build the database"
    )]
    pub cdna: PathBuf,

    #[arg(
        short = 'c',
        long = "codon",
        required = false,
        help = "Codon translated into every amino acid",
        default_value = DEFAULT_CODON
    )]
    pub codon: Codon,

    #[arg(
        short = 'o',
        long = "output",
        required = true,
        help = "Path to output statistics .txt file"
    )]
    pub output: PathBuf,

    #[arg(
        short = 'p',
        long = "psm",
        required = true,
        help = "Path to output PSM .csv file"
    )]
    pub psm: PathBuf,
}
