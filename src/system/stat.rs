use std::path::Path;

use super::counters::{CORE_ID_MAX_LEN, CoreCounters, CpuCounterRecord};
use super::source::read_bounded;
use crate::error::{MonitorError, Result};

const SOURCE: &str = "cpu stat";
const CORE_PREFIX: &str = "cpu";

/// Upper bound for one read of the stat exposition.
pub const STAT_READ_LIMIT: usize = 80 * 1024;

// Order of the per-core columns up to `guest`. `nice` is validated and dropped.
const REQUIRED_FIELDS: [&str; 9] = [
    "user", "nice", "system", "idle", "iowait", "irq", "softirq", "steal", "guest",
];

pub fn read_cpu_counters(path: &Path) -> Result<CpuCounterRecord> {
    let contents = read_bounded(path, STAT_READ_LIMIT)?;
    if contents.truncated && ends_inside_core_run(&contents.text) {
        return Err(MonitorError::malformed(
            SOURCE,
            format!("per-core lines exceed the {STAT_READ_LIMIT} byte read limit"),
        ));
    }
    parse_cpu_counters(&contents.text)
}

/// Parses the per-core lines that follow the aggregate `cpu` line.
///
/// Parsing stops at the first line that is not `cpu<N>`.
pub fn parse_cpu_counters(contents: &str) -> Result<CpuCounterRecord> {
    let mut lines = contents.lines();

    let header = lines
        .next()
        .ok_or_else(|| MonitorError::malformed(SOURCE, "empty input"))?;
    if header.split_whitespace().next() != Some(CORE_PREFIX) {
        return Err(MonitorError::malformed(
            SOURCE,
            "first line is not the aggregate cpu line",
        ));
    }

    let mut cores = Vec::new();
    for (offset, line) in lines.enumerate() {
        let mut fields = line.split_whitespace();
        let Some(name) = fields.next() else {
            break;
        };
        if !is_core_name(name) {
            break;
        }
        // header is line 1
        let line_no = offset + 2;
        cores.push(parse_core_fields(name, fields, line_no)?);
    }

    if cores.is_empty() {
        return Err(MonitorError::NoCores);
    }
    Ok(CpuCounterRecord::new(cores))
}

fn is_core_name(name: &str) -> bool {
    name.strip_prefix(CORE_PREFIX)
        .is_some_and(|index| !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()))
}

fn parse_core_fields<'a>(
    name: &str,
    mut fields: impl Iterator<Item = &'a str>,
    line_no: usize,
) -> Result<CoreCounters> {
    if name.len() > CORE_ID_MAX_LEN {
        return Err(MonitorError::malformed(
            SOURCE,
            format!("line {line_no}: core id `{name}` longer than {CORE_ID_MAX_LEN} bytes"),
        ));
    }

    let mut values = [0u64; REQUIRED_FIELDS.len()];
    for (slot, field) in values.iter_mut().zip(REQUIRED_FIELDS) {
        let raw = fields.next().ok_or_else(|| {
            MonitorError::malformed(
                SOURCE,
                format!("line {line_no} ({name}): missing {field} field"),
            )
        })?;
        *slot = parse_counter(raw, name, field, line_no)?;
    }
    if let Some(raw) = fields.next() {
        parse_counter(raw, name, "guest_nice", line_no)?;
    }

    let [user, _nice, system, idle, iowait, irq, softirq, steal, guest] = values;
    Ok(CoreCounters {
        id: name.to_string(),
        user,
        system,
        idle,
        iowait,
        irq,
        softirq,
        steal,
        guest,
    })
}

fn parse_counter(raw: &str, name: &str, field: &str, line_no: usize) -> Result<u64> {
    raw.parse::<u64>().map_err(|e| {
        MonitorError::malformed(
            SOURCE,
            format!("line {line_no} ({name}): invalid {field} value `{raw}`: {e}"),
        )
    })
}

/// True when the last complete line of a cut-off read is still a core line,
/// meaning later cores may have been lost.
fn ends_inside_core_run(text: &str) -> bool {
    text.lines()
        .skip(1)
        .last()
        .and_then(|line| line.split_whitespace().next())
        .is_some_and(is_core_name)
}
