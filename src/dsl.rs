//! DSL parser and executor for customer pipelines.
//!
//! Pipeline format (CMS Pipelines style):
//! ```text
//! PIPE CUSTOMERS
//! | FILTER age > 50
//! | SORT age
//! | MAP age
//! | DISTINCT
//! | COLLECT LIST
//! ?
//! ```
//!
//! - `PIPE CUSTOMERS` starts the pipeline from the loaded records
//! - `| <stage>` continues to the next stage
//! - `?` on its own line marks the end of the pipeline
//!
//! Stage position rules:
//! - First stage must be a source: CUSTOMERS or HOLE
//! - A terminal (COLLECT, COUNT, FIRST, ANY) may only be last; without one
//!   the pipeline collects into a list
//! - CONSOLE passes through in the middle and collects a list when last
//!
//! Supported stages:
//! - `CUSTOMERS` - Every loaded customer record
//! - `HOLE` - An empty stream
//! - `MAP field` - Replace each customer with one of its fields
//! - `FILTER field op value` - Keep customers whose field compares true
//! - `FILTER op value` - Keep scalar values that compare true
//!   (ops: `=` `!=` `<` `<=` `>` `>=`; value bare or delimited)
//! - `SORT [field] [DESC]` - Stable sort by field, or by natural order
//! - `DISTINCT` - Drop repeated values
//! - `SKIP n` - Skip first n values
//! - `LIMIT n` / `TAKE n` - Keep first n values
//! - `COLLECT [LIST|SET|SORTED]` - Materialize the result
//! - `COUNT` - Emit the number of values (e.g., "COUNT=2")
//! - `FIRST` / `ANY` - Emit the first surviving value, if any
//! - Lines starting with `#` are comments

use crate::error::{Result, StreamError};
use crate::function::{Comparator, Predicate};
use crate::record::{Customer, Field, Item};
use crate::stage::{Collected, ContainerKind, Stage, StagePipeline};
use std::cmp::Ordering;
use tracing::debug;

/// Comparison operator used by FILTER.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    fn holds(self, ordering: Ordering) -> bool {
        match self {
            CmpOp::Eq => ordering == Ordering::Equal,
            CmpOp::Ne => ordering != Ordering::Equal,
            CmpOp::Lt => ordering == Ordering::Less,
            CmpOp::Le => ordering != Ordering::Greater,
            CmpOp::Gt => ordering == Ordering::Greater,
            CmpOp::Ge => ordering != Ordering::Less,
        }
    }
}

/// Container requested by COLLECT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectKind {
    List,
    Set,
    Sorted,
}

/// Parsed pipeline command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// CUSTOMERS - every loaded record
    Customers,
    /// HOLE - empty stream
    Hole,
    /// CONSOLE - pass through, or collect a list when last
    Console,
    /// MAP field
    Map { field: Field },
    /// FILTER [field] op value
    Filter {
        field: Option<Field>,
        op: CmpOp,
        value: String,
    },
    /// SORT [field] [DESC]
    Sort {
        field: Option<Field>,
        descending: bool,
    },
    /// DISTINCT
    Distinct,
    /// SKIP n
    Skip { n: usize },
    /// LIMIT n
    Limit { n: usize },
    /// COLLECT [LIST|SET|SORTED]
    Collect { kind: CollectKind },
    /// COUNT
    Count,
    /// FIRST
    First,
    /// ANY
    Any,
}

impl Command {
    /// Can this stage be the first stage in a pipeline (source)?
    pub fn can_be_first(&self) -> bool {
        matches!(self, Command::Customers | Command::Hole)
    }

    /// Does this stage consume the pipeline and produce the final result?
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Command::Collect { .. } | Command::Count | Command::First | Command::Any
        )
    }

    /// Get the stage name for error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Customers => "CUSTOMERS",
            Command::Hole => "HOLE",
            Command::Console => "CONSOLE",
            Command::Map { .. } => "MAP",
            Command::Filter { .. } => "FILTER",
            Command::Sort { .. } => "SORT",
            Command::Distinct => "DISTINCT",
            Command::Skip { .. } => "SKIP",
            Command::Limit { .. } => "LIMIT",
            Command::Collect { .. } => "COLLECT",
            Command::Count => "COUNT",
            Command::First => "FIRST",
            Command::Any => "ANY",
        }
    }
}

/// Parse DSL text into commands.
pub fn parse_commands(text: &str) -> Result<Vec<Command>> {
    let mut commands = Vec::new();

    for (line_num, line) in text.lines().enumerate() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Handle "PIPE COMMAND" - extract command after PIPE
        let line = if line.get(..5).is_some_and(|p| p.eq_ignore_ascii_case("PIPE ")) {
            line[5..].trim()
        } else if line.eq_ignore_ascii_case("PIPE") {
            continue;
        } else {
            line
        };

        // Handle continuation lines: "| COMMAND ..."
        let line = match line.strip_prefix('|') {
            Some(stripped) => stripped.trim(),
            None => line,
        };

        // Remove a standalone trailing ? (explicit end of pipeline)
        let line = match line.strip_suffix('?') {
            Some(head) if head.is_empty() || head.ends_with(char::is_whitespace) => {
                head.trim_end()
            }
            _ => line,
        };

        if line.is_empty() {
            continue;
        }

        let cmd = parse_command(line).map_err(|e| StreamError::parse(line_num + 1, e))?;
        commands.push(cmd);
    }

    Ok(commands)
}

/// Parse a single command line.
fn parse_command(line: &str) -> std::result::Result<Command, String> {
    let (word, rest) = match line.find(char::is_whitespace) {
        Some(idx) => (&line[..idx], line[idx..].trim()),
        None => (line, ""),
    };
    let keyword = word.to_uppercase();

    let no_args = |cmd: Command| {
        if rest.is_empty() {
            Ok(cmd)
        } else {
            Err(format!("{keyword} takes no arguments"))
        }
    };

    match keyword.as_str() {
        "CUSTOMERS" => no_args(Command::Customers),
        "HOLE" => no_args(Command::Hole),
        "CONSOLE" => no_args(Command::Console),
        "DISTINCT" => no_args(Command::Distinct),
        "COUNT" => no_args(Command::Count),
        "FIRST" | "FINDFIRST" => no_args(Command::First),
        "ANY" | "FINDANY" => no_args(Command::Any),
        "MAP" => parse_map(rest),
        "FILTER" => parse_filter(rest),
        "SORT" => parse_sort(rest),
        "SKIP" => Ok(Command::Skip {
            n: parse_count("SKIP", rest)?,
        }),
        "LIMIT" | "TAKE" => Ok(Command::Limit {
            n: parse_count("LIMIT", rest)?,
        }),
        "COLLECT" => parse_collect(rest),
        _ => Err(format!("Unknown command: {word}")),
    }
}

fn parse_field(name: &str) -> std::result::Result<Field, String> {
    Field::parse(name).ok_or_else(|| format!("Unknown field: {name}"))
}

/// Parse MAP command.
fn parse_map(rest: &str) -> std::result::Result<Command, String> {
    if rest.is_empty() {
        return Err("MAP requires a field name".to_string());
    }
    Ok(Command::Map {
        field: parse_field(rest)?,
    })
}

/// Parse FILTER command.
/// Formats:
///   FILTER age > 50
///   FILTER gender = "Female"
///   FILTER < 20             - compares the current scalar value
fn parse_filter(rest: &str) -> std::result::Result<Command, String> {
    let idx = rest
        .find(['!', '<', '>', '='])
        .ok_or("FILTER requires an operator (= != < <= > >=)")?;

    let field_part = rest[..idx].trim();
    let after = &rest[idx..];
    let (op, op_len) = if after.starts_with("!=") {
        (CmpOp::Ne, 2)
    } else if after.starts_with("<=") {
        (CmpOp::Le, 2)
    } else if after.starts_with(">=") {
        (CmpOp::Ge, 2)
    } else if after.starts_with('=') {
        (CmpOp::Eq, 1)
    } else if after.starts_with('<') {
        (CmpOp::Lt, 1)
    } else if after.starts_with('>') {
        (CmpOp::Gt, 1)
    } else {
        return Err("FILTER requires an operator (= != < <= > >=)".to_string());
    };

    let field = if field_part.is_empty() {
        None
    } else {
        Some(parse_field(field_part)?)
    };

    let value_part = after[op_len..].trim();
    if value_part.is_empty() {
        return Err("FILTER requires a value after the operator".to_string());
    }
    let value = if value_part.starts_with(['"', '\'', '/']) {
        let (value, trailing) = parse_delimited_string(value_part)?;
        if !trailing.trim().is_empty() {
            return Err(format!("Unexpected text after FILTER value: {}", trailing.trim()));
        }
        value
    } else {
        value_part.to_string()
    };

    Ok(Command::Filter { field, op, value })
}

/// Parse SORT command: `SORT`, `SORT DESC`, `SORT age`, `SORT age DESC`.
fn parse_sort(rest: &str) -> std::result::Result<Command, String> {
    let mut field = None;
    let mut descending = false;

    for token in rest.split_whitespace() {
        if token.eq_ignore_ascii_case("DESC") {
            descending = true;
        } else if token.eq_ignore_ascii_case("ASC") {
            descending = false;
        } else if field.is_none() && !descending {
            field = Some(parse_field(token)?);
        } else {
            return Err(format!("Unexpected SORT argument: {token}"));
        }
    }

    Ok(Command::Sort { field, descending })
}

/// Parse the count argument of SKIP or LIMIT.
fn parse_count(stage: &str, rest: &str) -> std::result::Result<usize, String> {
    let n: i64 = rest
        .parse()
        .map_err(|_| format!("{stage} requires a number"))?;
    usize::try_from(n).map_err(|_| format!("{stage} count must be non-negative"))
}

/// Parse COLLECT command.
fn parse_collect(rest: &str) -> std::result::Result<Command, String> {
    let kind = match rest.to_uppercase().as_str() {
        "" | "LIST" => CollectKind::List,
        "SET" => CollectKind::Set,
        "SORTED" | "SORTEDSET" | "TREESET" => CollectKind::Sorted,
        other => return Err(format!("Unknown COLLECT target: {other}")),
    };
    Ok(Command::Collect { kind })
}

/// Parse a delimited string using CMS Pipelines convention.
/// The first non-blank character is the delimiter, and the string
/// continues until the next occurrence of that delimiter.
/// Returns (extracted_string, rest_of_input).
fn parse_delimited_string(s: &str) -> std::result::Result<(String, &str), String> {
    let s = s.trim_start();
    let delim = s.chars().next().ok_or("Expected delimited string")?;
    let after_delim = &s[delim.len_utf8()..];

    match after_delim.find(delim) {
        Some(end) => Ok((
            after_delim[..end].to_string(),
            &after_delim[end + delim.len_utf8()..],
        )),
        None => Err(format!("Unclosed delimiter '{delim}'")),
    }
}

// ---------------------------------------------------------------------------
// Planning: shape check and lowering onto evaluator stages
// ---------------------------------------------------------------------------

/// What kind of item flows between two stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Customers,
    Scalar { numeric: bool },
}

/// Terminal operation of a planned pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    Collect(CollectKind),
    Count,
    First,
    Any,
}

/// A validated pipeline ready to run.
pub struct Plan {
    source: Command,
    stage_names: Vec<&'static str>,
    /// DSL position of each lowered stage.
    stage_indexes: Vec<usize>,
    stages: Vec<Stage<'static, Item>>,
    terminal: Terminal,
    /// DSL position of the last command, where a terminal sits.
    terminal_index: usize,
}

impl Plan {
    /// Names of the lowered stages followed by the terminal.
    pub fn describe(&self) -> Vec<String> {
        let mut names = vec![self.source.name().to_string()];
        names.extend(self.stage_names.iter().map(|s| s.to_string()));
        names.push(format!("{:?}", self.terminal).to_uppercase());
        names
    }

    pub fn terminal(&self) -> Terminal {
        self.terminal
    }

    /// Map an evaluator stage index onto the DSL command position.
    ///
    /// Evaluator indexes skip the source and any pass-through CONSOLE
    /// stages; an index past the last lowered stage is the terminal.
    fn dsl_index(&self, index: usize) -> usize {
        self.stage_indexes
            .get(index)
            .copied()
            .unwrap_or(self.terminal_index)
    }
}

/// Validate the command list and lower it onto evaluator stages.
///
/// Stage indexes in errors are command positions, with the source at 0.
pub fn plan(commands: Vec<Command>) -> Result<Plan> {
    let mut commands = commands.into_iter();
    let source = commands.next().ok_or(StreamError::EmptyPipeline)?;
    if !source.can_be_first() {
        return Err(StreamError::SourceRequired {
            stage: source.name().to_string(),
        });
    }

    let commands: Vec<Command> = commands.collect();
    let last = commands.len();
    let mut shape = Shape::Customers;
    let mut stages = Vec::new();
    let mut stage_names = Vec::new();
    let mut stage_indexes = Vec::new();
    let mut terminal = Terminal::Collect(CollectKind::List);

    for (offset, cmd) in commands.into_iter().enumerate() {
        let index = offset + 1;
        let name = cmd.name();

        if cmd.can_be_first() {
            return Err(StreamError::invalid_stage(
                index,
                name,
                "a source can only be the first stage",
            ));
        }
        if cmd.is_terminal() && index != last {
            return Err(StreamError::invalid_stage(
                index,
                name,
                "a terminal stage must be the last stage",
            ));
        }

        let stage = match cmd {
            Command::Console => None,
            Command::Map { field } => {
                if shape != Shape::Customers {
                    return Err(StreamError::invalid_stage(
                        index,
                        name,
                        format!("cannot read field '{}' from scalar values", field.name()),
                    ));
                }
                shape = Shape::Scalar {
                    numeric: field.is_numeric(),
                };
                Some(Stage::transform(move |item: Item| match item {
                    Item::Customer(c) => c.field(field),
                    other => other,
                }))
            }
            Command::Filter { field, op, value } => {
                Some(lower_filter(index, shape, field, op, &value)?)
            }
            Command::Sort { field, descending } => {
                Some(lower_sort(index, shape, field, descending)?)
            }
            Command::Distinct => Some(Stage::Distinct),
            Command::Skip { n } => Some(Stage::Skip(n)),
            Command::Limit { n } => Some(Stage::Limit(n)),
            Command::Collect { kind } => {
                terminal = Terminal::Collect(kind);
                None
            }
            Command::Count => {
                terminal = Terminal::Count;
                None
            }
            Command::First => {
                terminal = Terminal::First;
                None
            }
            Command::Any => {
                terminal = Terminal::Any;
                None
            }
            Command::Customers | Command::Hole => None,
        };

        if let Some(stage) = stage {
            stage_names.push(name);
            stage_indexes.push(index);
            stages.push(stage);
        }
    }

    Ok(Plan {
        source,
        stage_names,
        stage_indexes,
        stages,
        terminal,
        terminal_index: last,
    })
}

/// Build the literal a FILTER value is compared against.
fn filter_literal(index: usize, numeric: bool, value: &str) -> Result<Item> {
    if numeric {
        value.trim().parse::<i64>().map(Item::Int).map_err(|_| {
            StreamError::invalid_stage(index, "FILTER", format!("'{value}' is not a number"))
        })
    } else {
        Ok(Item::Text(value.to_string()))
    }
}

fn lower_filter(
    index: usize,
    shape: Shape,
    field: Option<Field>,
    op: CmpOp,
    value: &str,
) -> Result<Stage<'static, Item>> {
    let predicate = match (field, shape) {
        (Some(field), Shape::Customers) => {
            let literal = filter_literal(index, field.is_numeric(), value)?;
            Predicate::new(move |item: &Item| {
                item.as_customer()
                    .and_then(|c| c.field(field).natural_cmp(&literal))
                    .is_some_and(|ord| op.holds(ord))
            })
        }
        (None, Shape::Scalar { numeric }) => {
            let literal = filter_literal(index, numeric, value)?;
            Predicate::new(move |item: &Item| {
                item.natural_cmp(&literal).is_some_and(|ord| op.holds(ord))
            })
        }
        (Some(field), Shape::Scalar { .. }) => {
            return Err(StreamError::invalid_stage(
                index,
                "FILTER",
                format!("cannot read field '{}' from scalar values", field.name()),
            ));
        }
        (None, Shape::Customers) => {
            return Err(StreamError::invalid_stage(
                index,
                "FILTER",
                "customer records need a field to compare",
            ));
        }
    };
    Ok(Stage::Filter(predicate))
}

fn lower_sort(
    index: usize,
    shape: Shape,
    field: Option<Field>,
    descending: bool,
) -> Result<Stage<'static, Item>> {
    let comparator = match (field, shape) {
        (Some(field), Shape::Customers) => Some(Comparator::new(move |a: &Item, b: &Item| {
            match (a.as_customer(), b.as_customer()) {
                (Some(a), Some(b)) => a
                    .field(field)
                    .natural_cmp(&b.field(field))
                    .unwrap_or(Ordering::Equal),
                _ => Ordering::Equal,
            }
        })),
        (Some(field), Shape::Scalar { .. }) => {
            return Err(StreamError::invalid_stage(
                index,
                "SORT",
                format!("cannot read field '{}' from scalar values", field.name()),
            ));
        }
        // No comparator: the evaluator falls back to natural order, which
        // customers lack.
        (None, Shape::Customers) => None,
        (None, Shape::Scalar { .. }) if descending => Some(Comparator::new(
            |a: &Item, b: &Item| a.natural_cmp(b).unwrap_or(Ordering::Equal),
        )),
        (None, Shape::Scalar { .. }) => None,
    };

    Ok(match comparator {
        Some(cmp) if descending => Stage::sort_by(cmp.reversed()),
        Some(cmp) => Stage::sort_by(cmp),
        None => Stage::sorted(),
    })
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Result of running a planned pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Items(Vec<Item>),
    Count(usize),
    Found(Option<Item>),
}

impl Outcome {
    /// Render one output line per result.
    pub fn lines(&self) -> Vec<String> {
        match self {
            Outcome::Items(items) => items.iter().map(Item::to_string).collect(),
            Outcome::Count(n) => vec![format!("COUNT={n}")],
            Outcome::Found(found) => found.iter().map(Item::to_string).collect(),
        }
    }
}

/// Run a planned pipeline over `customers`.
///
/// Returns the outcome and the number of source records.
pub fn run_plan(mut plan: Plan, customers: &[Customer]) -> Result<(Outcome, usize)> {
    let source: Vec<Item> = match plan.source {
        Command::Customers => customers.iter().cloned().map(Item::Customer).collect(),
        _ => Vec::new(),
    };
    let input_count = source.len();
    debug!(stages = ?plan.describe(), input_count, "running pipeline");

    let terminal = plan.terminal;
    let stages = std::mem::take(&mut plan.stages);
    let pipeline = StagePipeline::with_stages(&source, stages);
    let relocate = |err| relocate_index(&plan, err);

    let outcome = match terminal {
        Terminal::Collect(kind) => {
            let container = match kind {
                CollectKind::List => ContainerKind::List,
                CollectKind::Set => ContainerKind::Set,
                CollectKind::Sorted => ContainerKind::SortedSet(None),
            };
            let collected = pipeline.collect(container).map_err(relocate)?;
            Outcome::Items(render_order(collected))
        }
        Terminal::Count => Outcome::Count(pipeline.count().map_err(relocate)?),
        Terminal::First => Outcome::Found(pipeline.find_first().map_err(relocate)?),
        Terminal::Any => Outcome::Found(pipeline.find_any().map_err(relocate)?),
    };

    Ok((outcome, input_count))
}

fn render_order(collected: Collected<Item>) -> Vec<Item> {
    match collected {
        Collected::Set(set) => {
            let mut items: Vec<Item> = set.into_iter().collect();
            items.sort_by(set_order);
            items
        }
        other => other.into_vec(),
    }
}

/// Total order for printing sets: natural order for scalars, id for
/// customers, rendered text as the final tie-break.
fn set_order(a: &Item, b: &Item) -> Ordering {
    let primary = match (a.as_customer(), b.as_customer()) {
        (Some(x), Some(y)) => Some(x.id().cmp(&y.id())),
        _ => a.natural_cmp(b),
    };
    primary
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.to_string().cmp(&b.to_string()))
}

/// Evaluator errors carry evaluator positions; report DSL positions.
fn relocate_index(plan: &Plan, err: StreamError) -> StreamError {
    match err {
        StreamError::InvalidComparator { index, stage } => StreamError::InvalidComparator {
            index: plan.dsl_index(index),
            stage,
        },
        other => other,
    }
}

/// Execute a pipeline defined by DSL text on loaded customers.
///
/// Returns (output_text, input_count, output_count) on success.
pub fn execute_pipeline(
    customers: &[Customer],
    pipeline_text: &str,
) -> Result<(String, usize, usize)> {
    let commands = parse_commands(pipeline_text)?;
    let plan = plan(commands)?;
    let (outcome, input_count) = run_plan(plan, customers)?;

    let lines = outcome.lines();
    let output_count = lines.len();
    Ok((lines.join("\n"), input_count, output_count))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customers() -> Vec<Customer> {
        vec![
            Customer::new(1, "Ama", "Mensah", "ama@example.com", "Female", 15),
            Customer::new(2, "Kofi", "Boateng", "kofi@example.com", "Male", 22),
            Customer::new(3, "Esi", "Owusu", "esi@example.com", "Female", 51),
            Customer::new(4, "Yaw", "Asante", "yaw@example.com", "Male", 51),
            Customer::new(5, "Abena", "Darko", "abena@example.com", "Female", 8),
        ]
    }

    #[test]
    fn test_parse_filter_numeric() {
        let cmd = parse_command("FILTER age > 50").unwrap();
        assert_eq!(
            cmd,
            Command::Filter {
                field: Some(Field::Age),
                op: CmpOp::Gt,
                value: "50".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_filter_quoted() {
        let cmd = parse_command(r#"FILTER gender != "Female""#).unwrap();
        match cmd {
            Command::Filter { field, op, value } => {
                assert_eq!(field, Some(Field::Gender));
                assert_eq!(op, CmpOp::Ne);
                assert_eq!(value, "Female");
            }
            _ => panic!("Expected Filter"),
        }
    }

    #[test]
    fn test_parse_filter_scalar() {
        let cmd = parse_command("FILTER <= 20").unwrap();
        assert!(matches!(
            cmd,
            Command::Filter {
                field: None,
                op: CmpOp::Le,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_filter_errors() {
        assert!(parse_command("FILTER age").is_err());
        assert!(parse_command("FILTER age >").is_err());
        assert!(parse_command("FILTER salary > 5").is_err());
        assert!(parse_command(r#"FILTER email = "unclosed"#).is_err());
    }

    #[test]
    fn test_parse_sort_variants() {
        assert_eq!(
            parse_command("SORT").unwrap(),
            Command::Sort {
                field: None,
                descending: false
            }
        );
        assert_eq!(
            parse_command("SORT age DESC").unwrap(),
            Command::Sort {
                field: Some(Field::Age),
                descending: true
            }
        );
        assert_eq!(
            parse_command("sort desc").unwrap(),
            Command::Sort {
                field: None,
                descending: true
            }
        );
        assert!(parse_command("SORT age email").is_err());
    }

    #[test]
    fn test_parse_skip_limit() {
        assert_eq!(parse_command("SKIP 5").unwrap(), Command::Skip { n: 5 });
        assert_eq!(parse_command("TAKE 3").unwrap(), Command::Limit { n: 3 });
        let err = parse_command("SKIP -1").unwrap_err();
        assert!(err.contains("non-negative"), "Got: {err}");
        assert!(parse_command("LIMIT many").is_err());
    }

    #[test]
    fn test_parse_collect() {
        assert_eq!(
            parse_command("COLLECT").unwrap(),
            Command::Collect {
                kind: CollectKind::List
            }
        );
        assert_eq!(
            parse_command("COLLECT sorted").unwrap(),
            Command::Collect {
                kind: CollectKind::Sorted
            }
        );
        assert!(parse_command("COLLECT BAG").is_err());
    }

    #[test]
    fn test_parse_unknown_command() {
        let err = parse_command("FROB 1").unwrap_err();
        assert_eq!(err, "Unknown command: FROB");
    }

    #[test]
    fn test_parse_commands_layout() {
        let text = "# ages over fifty\nPIPE CUSTOMERS\n| FILTER age > 50\n\n| COUNT\n?";
        let commands = parse_commands(text).unwrap();
        assert_eq!(commands.len(), 3);
        assert_eq!(commands[0], Command::Customers);
        assert_eq!(commands[2], Command::Count);
    }

    #[test]
    fn test_parse_keeps_question_mark_in_value() {
        let commands = parse_commands("PIPE CUSTOMERS\n| FILTER email = who?\n?").unwrap();
        assert_eq!(commands.len(), 2);
        match &commands[1] {
            Command::Filter { value, .. } => assert_eq!(value, "who?"),
            other => panic!("Expected Filter, got {other:?}"),
        }

        let commands = parse_commands("PIPE CUSTOMERS\n| COUNT ?").unwrap();
        assert_eq!(commands[1], Command::Count);
    }

    #[test]
    fn test_parse_filter_rejects_text_after_delimited_value() {
        let err = parse_command(r#"FILTER gender = "Female" junk"#).unwrap_err();
        assert!(err.contains("junk"), "Got: {err}");
        assert!(parse_command(r#"FILTER gender = "Female"   "#).is_ok());
    }

    #[test]
    fn test_parse_commands_reports_line() {
        let text = "PIPE CUSTOMERS\n| FILTER age > 50\n| BOGUS";
        match parse_commands(text) {
            Err(StreamError::Parse { line, message }) => {
                assert_eq!(line, 3);
                assert!(message.contains("BOGUS"));
            }
            other => panic!("Expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_execute_sort_distinct() {
        let pipeline = "PIPE CUSTOMERS\n| SORT age\n| MAP age\n| DISTINCT\n| COLLECT LIST\n?";
        let (output, input_count, output_count) =
            execute_pipeline(&customers(), pipeline).unwrap();
        assert_eq!(input_count, 5);
        assert_eq!(output_count, 4);
        assert_eq!(output, "8\n15\n22\n51");
    }

    #[test]
    fn test_execute_count() {
        let pipeline = "PIPE CUSTOMERS\n| FILTER age > 50\n| COUNT";
        let (output, _, output_count) = execute_pipeline(&customers(), pipeline).unwrap();
        assert_eq!(output, "COUNT=2");
        assert_eq!(output_count, 1);
    }

    #[test]
    fn test_execute_first_and_any() {
        let first = "PIPE CUSTOMERS\n| FILTER age < 20\n| MAP first_name\n| FIRST";
        let (output, _, _) = execute_pipeline(&customers(), first).unwrap();
        assert_eq!(output, "Ama");

        let any = "PIPE CUSTOMERS\n| FILTER age < 18\n| MAP id\n| ANY";
        let (output, _, _) = execute_pipeline(&customers(), any).unwrap();
        assert_eq!(output, "1");

        let none = "PIPE CUSTOMERS\n| FILTER age > 90\n| FIRST";
        let (output, _, output_count) = execute_pipeline(&customers(), none).unwrap();
        assert!(output.is_empty());
        assert_eq!(output_count, 0);
    }

    #[test]
    fn test_execute_sorted_set() {
        let pipeline = "PIPE CUSTOMERS\n| MAP age\n| COLLECT SORTED";
        let (output, _, _) = execute_pipeline(&customers(), pipeline).unwrap();
        assert_eq!(output, "8\n15\n22\n51");
    }

    #[test]
    fn test_execute_set_output_is_stable() {
        let pipeline = "PIPE CUSTOMERS\n| MAP gender\n| COLLECT SET";
        let (output, _, output_count) = execute_pipeline(&customers(), pipeline).unwrap();
        assert_eq!(output, "Female\nMale");
        assert_eq!(output_count, 2);
    }

    #[test]
    fn test_execute_customer_set_output_is_stable() {
        let pipeline = "PIPE CUSTOMERS\n| COLLECT SET";
        let (first, _, output_count) = execute_pipeline(&customers(), pipeline).unwrap();
        assert_eq!(output_count, 5);
        assert!(first.starts_with("Customer{id=1,"), "Got: {first}");
        for _ in 0..20 {
            let (again, _, _) = execute_pipeline(&customers(), pipeline).unwrap();
            assert_eq!(again, first);
        }
    }

    #[test]
    fn test_execute_skip_limit() {
        let pipeline = "PIPE CUSTOMERS\n| MAP first_name\n| SKIP 1\n| LIMIT 2";
        let (output, _, _) = execute_pipeline(&customers(), pipeline).unwrap();
        assert_eq!(output, "Kofi\nEsi");
    }

    #[test]
    fn test_execute_sort_desc_and_scalar_filter() {
        let pipeline = "PIPE CUSTOMERS\n| MAP age\n| FILTER >= 15\n| SORT DESC\n| CONSOLE";
        let (output, _, _) = execute_pipeline(&customers(), pipeline).unwrap();
        assert_eq!(output, "51\n51\n22\n15");
    }

    #[test]
    fn test_execute_sort_by_field_desc_keeps_records() {
        let pipeline = "PIPE CUSTOMERS\n| SORT age DESC\n| LIMIT 1\n| MAP email";
        let (output, _, _) = execute_pipeline(&customers(), pipeline).unwrap();
        // Stable: Esi precedes Yaw at age 51.
        assert_eq!(output, "esi@example.com");
    }

    #[test]
    fn test_sort_customers_without_field_fails() {
        let pipeline = "PIPE CUSTOMERS\n| FILTER age > 1\n| SORT\n| COUNT";
        let err = execute_pipeline(&customers(), pipeline).unwrap_err();
        match err {
            StreamError::InvalidComparator { index, stage } => {
                assert_eq!(index, 2);
                assert_eq!(stage, "SORT");
            }
            other => panic!("Expected InvalidComparator, got {other:?}"),
        }
    }

    #[test]
    fn test_sort_error_index_counts_console() {
        let pipeline = "PIPE CUSTOMERS\n| CONSOLE\n| SORT\n| COUNT";
        let err = execute_pipeline(&customers(), pipeline).unwrap_err();
        match err {
            StreamError::InvalidComparator { index, stage } => {
                assert_eq!(index, 2);
                assert_eq!(stage, "SORT");
            }
            other => panic!("Expected InvalidComparator, got {other:?}"),
        }

        let pipeline = "PIPE CUSTOMERS\n| CONSOLE\n| CONSOLE\n| COLLECT SORTED";
        let err = execute_pipeline(&customers(), pipeline).unwrap_err();
        assert!(matches!(
            err,
            StreamError::InvalidComparator { index: 3, .. }
        ));
    }

    #[test]
    fn test_sorted_set_of_customers_fails() {
        let pipeline = "PIPE CUSTOMERS\n| COLLECT SORTED";
        let err = execute_pipeline(&customers(), pipeline).unwrap_err();
        assert!(matches!(
            err,
            StreamError::InvalidComparator { index: 1, .. }
        ));
    }

    #[test]
    fn test_pipeline_requires_source_first() {
        let err = execute_pipeline(&customers(), "PIPE FILTER age > 1\n| COUNT").unwrap_err();
        assert!(
            err.to_string().contains("FILTER cannot be the first stage"),
            "Got: {err}"
        );
    }

    #[test]
    fn test_empty_pipeline() {
        let err = execute_pipeline(&customers(), "# nothing\n?").unwrap_err();
        assert!(matches!(err, StreamError::EmptyPipeline));
    }

    #[test]
    fn test_terminal_must_be_last() {
        let err = execute_pipeline(&customers(), "PIPE CUSTOMERS\n| COUNT\n| DISTINCT").unwrap_err();
        assert!(matches!(err, StreamError::InvalidStage { index: 1, .. }));
    }

    #[test]
    fn test_field_on_scalar_is_invalid() {
        let err =
            execute_pipeline(&customers(), "PIPE CUSTOMERS\n| MAP age\n| FILTER age > 3").unwrap_err();
        match err {
            StreamError::InvalidStage { index, stage, .. } => {
                assert_eq!(index, 2);
                assert_eq!(stage, "FILTER");
            }
            other => panic!("Expected InvalidStage, got {other:?}"),
        }
        assert!(execute_pipeline(&customers(), "PIPE CUSTOMERS\n| MAP age\n| MAP email").is_err());
        assert!(execute_pipeline(&customers(), "PIPE CUSTOMERS\n| MAP age\n| SORT age").is_err());
    }

    #[test]
    fn test_non_numeric_literal_for_numeric_field() {
        let err = execute_pipeline(&customers(), "PIPE CUSTOMERS\n| FILTER age > old").unwrap_err();
        assert!(err.to_string().contains("'old' is not a number"));
    }

    #[test]
    fn test_hole_source() {
        let (output, input_count, output_count) =
            execute_pipeline(&customers(), "PIPE HOLE\n| COUNT").unwrap();
        assert_eq!(output, "COUNT=0");
        assert_eq!(input_count, 0);
        assert_eq!(output_count, 1);
    }

    #[test]
    fn test_plan_describe() {
        let commands = parse_commands("PIPE CUSTOMERS\n| CONSOLE\n| FILTER age > 1\n| COUNT").unwrap();
        let plan = plan(commands).unwrap();
        assert_eq!(plan.describe(), vec!["CUSTOMERS", "FILTER", "COUNT"]);
        assert_eq!(plan.terminal(), Terminal::Count);
    }
}
