//! Command line arguments

use crate::data::{CsvSource, DataSource, WebSource, DEFAULT_TIMEOUT};
use clap::{ArgGroup, Parser};
use std::path::PathBuf;
use std::time::Duration;

/// Generate chart infographics from a CSV file or a webpage table
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(group(ArgGroup::new("source").required(true).args(["url", "csv"])))]
pub struct Args {
    /// Webpage holding the data table
    #[arg(long)]
    pub url: Option<String>,

    /// Local CSV file
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Company name used in titles and file names
    #[arg(long, default_value = "Company")]
    pub company: String,

    /// Output folder, defaults to `<company>_Infographics`
    #[arg(long)]
    pub folder: Option<PathBuf>,

    /// JSON style override file
    #[arg(long)]
    pub style: Option<PathBuf>,

    /// HTTP timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub timeout: u64,

    /// Log filter, e.g. `info` or `infographics=debug`
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    pub fn output_folder(&self) -> PathBuf {
        self.folder.clone().unwrap_or_else(|| {
            PathBuf::from(format!("{}_Infographics", self.company.replace(' ', "_")))
        })
    }

    /// The selected data source, `None` only when built without clap's checks.
    pub fn source(&self) -> Option<Box<dyn DataSource>> {
        if let Some(url) = &self.url {
            let source = WebSource::new(url.clone()).with_timeout(Duration::from_secs(self.timeout));
            return Some(Box::new(source));
        }
        let path = self.csv.clone()?;
        Some(Box::new(CsvSource::new(path)))
    }
}

/// One-line message for a fatal error, causes included.
pub fn error_report(err: &anyhow::Error) -> String {
    format!("Error: {err:#}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_company_name() {
        let args = Args::try_parse_from([
            "infographics",
            "--csv",
            "data.csv",
            "--company",
            "Eternal Ltd",
        ])
        .unwrap();
        assert_eq!(args.output_folder(), PathBuf::from("Eternal_Ltd_Infographics"));
        assert_eq!(args.timeout, DEFAULT_TIMEOUT.as_secs());
        assert_eq!(args.log_level, "info");
        assert_eq!(args.source().unwrap().describe(), "data.csv");
    }

    #[test]
    fn company_defaults_to_generic_name() {
        let args = Args::try_parse_from(["infographics", "--url", "https://example.com/q"]).unwrap();
        assert_eq!(args.company, "Company");
        assert_eq!(args.output_folder(), PathBuf::from("Company_Infographics"));
        assert_eq!(args.source().unwrap().describe(), "https://example.com/q");
    }

    #[test]
    fn explicit_folder_wins() {
        let args =
            Args::try_parse_from(["infographics", "--csv", "a.csv", "--folder", "out/charts"])
                .unwrap();
        assert_eq!(args.output_folder(), PathBuf::from("out/charts"));
    }

    #[test]
    fn exactly_one_source_is_required() {
        assert!(Args::try_parse_from(["infographics"]).is_err());
        assert!(Args::try_parse_from([
            "infographics",
            "--csv",
            "a.csv",
            "--url",
            "https://example.com"
        ])
        .is_err());
    }

    #[test]
    fn error_report_names_every_cause() {
        let err = anyhow::anyhow!("Insufficient data: table has no rows")
            .context("No infographics generated");
        assert_eq!(
            error_report(&err),
            "Error: No infographics generated: Insufficient data: table has no rows"
        );
    }
}
