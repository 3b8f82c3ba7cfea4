//! Engine entry point: resolve, filter, dispatch

use polars::prelude::*;

use crate::config::EngineConfig;
use crate::filter;
use crate::instruction::Instruction;
use crate::ops::{self, OperationContext};
use crate::resolver::ColumnResolver;
use crate::source::{load_or_empty, TableSource};
use crate::synonyms::SynonymMap;

/// Runs instructions against tables
///
/// Every call builds its own synonym map, resolver and row mask; nothing is
/// kept between calls and the input table is never modified.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    /// Create an engine with the given settings
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// The engine's settings
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run `instruction` over `df`
    ///
    /// Never fails: problems are logged and degrade to a skipped filter, an
    /// empty table or the filtered table, depending on where they happen.
    #[must_use]
    pub fn run(&self, df: &DataFrame, instruction: &Instruction) -> DataFrame {
        let synonyms = SynonymMap::build(
            &self.config.base_synonyms,
            &instruction.column_mapping_override,
        );
        let resolver = ColumnResolver::new(df, &synonyms);

        let mask = filter::build_mask(df, &resolver, instruction, &self.config);
        let filtered = match mask.apply(df) {
            Ok(filtered) => filtered,
            Err(e) => {
                log::warn!("Could not apply filters: {e}");
                return DataFrame::empty();
            }
        };
        log::info!("{} of {} rows kept by filters", filtered.height(), df.height());

        if filtered.height() == 0 {
            log::info!("No rows left after filtering; returning an empty result");
            return DataFrame::empty();
        }

        ops::dispatch(&OperationContext {
            filtered: &filtered,
            original: df,
            resolver: &resolver,
            instruction,
            config: &self.config,
        })
    }

    /// Load the instruction's source through `loader`, then [`Engine::run`]
    ///
    /// A missing or unreadable source behaves like an empty table.
    #[must_use]
    pub fn execute(&self, loader: &dyn TableSource, instruction: &Instruction) -> DataFrame {
        let df = match instruction.source.as_deref() {
            Some(source) => load_or_empty(
                loader,
                source,
                instruction.sheet.as_ref(),
                instruction.header_row.unwrap_or(0),
            ),
            None => {
                log::warn!("Instruction names no table source");
                DataFrame::empty()
            }
        };
        self.run(&df, instruction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::instruction::SheetSelector;
    use pretty_assertions::assert_eq;

    struct FixedSource(DataFrame);

    impl TableSource for FixedSource {
        fn load_table(
            &self,
            source: &str,
            _sheet: Option<&SheetSelector>,
            _header_row: usize,
        ) -> Result<DataFrame> {
            if source == "fare.xlsx" {
                Ok(self.0.clone())
            } else {
                Err(Error::source_error(format!("no such source: {source}")))
            }
        }
    }

    fn fares() -> DataFrame {
        df! {
            "Fare" => [10.0, 60.0, 75.0],
            "Survived" => [0, 1, 1],
        }
        .unwrap()
    }

    #[test]
    fn test_execute_loads_source() {
        let loader = FixedSource(fares());
        let mut instruction = Instruction::new()
            .with_filter("Fare", ">= 50")
            .with_operation("count");
        instruction.source = Some("fare.xlsx".to_string());

        let result = Engine::default().execute(&loader, &instruction);
        assert_eq!(
            result.column("count").unwrap().u64().unwrap().get(0),
            Some(2)
        );
    }

    #[test]
    fn test_execute_missing_source_is_empty() {
        let loader = FixedSource(fares());
        let mut instruction = Instruction::new().with_operation("count");
        instruction.source = Some("other.xlsx".to_string());
        assert_eq!(Engine::default().execute(&loader, &instruction).shape(), (0, 0));

        instruction.source = None;
        assert_eq!(Engine::default().execute(&loader, &instruction).shape(), (0, 0));
    }

    #[test]
    fn test_empty_filter_result_skips_operation() {
        let instruction = Instruction::new()
            .with_filter("Fare", "> 1000")
            .with_operation("count");
        assert_eq!(Engine::default().run(&fares(), &instruction).shape(), (0, 0));
    }

    #[test]
    fn test_input_is_not_modified() {
        let df = fares();
        let instruction = Instruction::new()
            .with_filter("Survived", "1")
            .with_operation("list");
        let result = Engine::default().run(&df, &instruction);
        assert_eq!(result.height(), 2);
        assert!(df.equals(&fares()));
    }
}
