//! `glassline query` handler.

use glassline_core::{Engine, Outcome, Query};

use crate::cli::{GlobalOpts, QueryArgs};
use crate::error::CliError;
use crate::output::{self, QueryReport};

pub async fn handle(engine: &Engine, args: &QueryArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let query = Query::new(&args.location, args.query_type, &args.target);
    let result = if args.no_cache {
        engine.query_uncached(&query).await?
    } else {
        engine.query(&query).await?
    };

    let report = QueryReport::new(&query, &result);
    let color = output::should_color(global.color);

    // Structured output always carries the result; for people, a failure is
    // reported once, on stderr.
    if result.is_success() || global.output.is_structured() {
        let rendered = output::render_report(global.output, &report, color)?;
        output::print_output(&rendered, global.quiet)?;
    }

    match result.outcome {
        Outcome::Succeeded => Ok(()),
        Outcome::Rejected => Err(CliError::Rejected {
            message: result.output,
            status: result.status_code,
        }),
        Outcome::Failed => Err(CliError::QueryFailed {
            message: result.output,
            status: result.status_code,
        }),
    }
}
