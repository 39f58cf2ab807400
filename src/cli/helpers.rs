//! `helpers` command: list template helper filters.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::templating::HelperFunctions;

/// List the helper filters every template can use.
#[derive(Args, Debug)]
pub struct HelpersCommand {
    /// Print names only
    #[arg(long)]
    pub names_only: bool,
}

impl HelpersCommand {
    pub fn execute(self) -> Result<()> {
        print!("{}", self.format(HelperFunctions::shared()));
        Ok(())
    }

    fn format(&self, helpers: &HelperFunctions) -> String {
        let width = helpers.iter().map(|h| h.name.len()).max().unwrap_or(0);
        helpers
            .iter()
            .map(|helper| {
                if self.names_only {
                    format!("{}\n", helper.name)
                } else {
                    format!("{:width$}  {}\n", helper.name.bold(), helper.description)
                }
            })
            .collect()
    }
}
