//! `glassline batch` handler.
//!
//! Every line runs concurrently through the same cache, so duplicate lines
//! share one device call.

use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;

use futures::future::join_all;

use glassline_core::{Engine, ExecutionResult, Query, QueryType};

use crate::cli::{BatchArgs, GlobalOpts};
use crate::error::CliError;
use crate::output::{self, QueryReport};

pub async fn handle(engine: &Engine, args: &BatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let text = if args.file == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(&args.file)?
    };

    let queries = parse(&text)?;
    if let Some(unknown) = queries
        .iter()
        .find(|q| engine.registry().device(q.location()).is_none())
    {
        return Err(CliError::UnknownLocation {
            location: unknown.location().to_owned(),
        });
    }

    let results = join_all(queries.iter().map(|q| engine.query(q)))
        .await
        .into_iter()
        .collect::<Result<Vec<ExecutionResult>, _>>()?;

    let reports: Vec<QueryReport<'_>> = queries
        .iter()
        .zip(&results)
        .map(|(q, r)| QueryReport::new(q, r))
        .collect();
    let rendered =
        output::render_reports(global.output, &reports, output::should_color(global.color))?;
    output::print_output(&rendered, global.quiet)?;

    let failed = results.iter().filter(|r| !r.is_success()).count();
    if failed > 0 {
        return Err(CliError::BatchFailed {
            failed,
            total: results.len(),
        });
    }
    Ok(())
}

/// Parse `location query-type target` lines. The target is the rest of the
/// line, so AS path expressions may contain spaces.
fn parse(text: &str) -> Result<Vec<Query>, CliError> {
    let mut queries = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let syntax = |reason: String| CliError::BatchLine {
            line: idx + 1,
            reason,
        };

        let (location, rest) = line
            .split_once(char::is_whitespace)
            .ok_or_else(|| syntax("expected `location query-type target`".into()))?;
        let (query_type, target) = rest
            .trim_start()
            .split_once(char::is_whitespace)
            .ok_or_else(|| syntax("missing target".into()))?;
        let query_type = QueryType::from_str(query_type)
            .map_err(|_| syntax(format!("unknown query type '{query_type}'")))?;

        queries.push(Query::new(location, query_type, target));
    }
    Ok(queries)
}
