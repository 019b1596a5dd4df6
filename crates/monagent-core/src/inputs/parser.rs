//! Parsers for `/proc` files.
//!
//! Pure functions over file content, independent of where it was read from.

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Parsed data from `/proc/loadavg`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadAvg {
    pub load1: f64,
    pub load5: f64,
    pub load15: f64,
    pub running: u32,
    pub total: u32,
}

/// Parses `/proc/loadavg` content.
pub fn parse_loadavg(content: &str) -> Result<LoadAvg, ParseError> {
    let parts: Vec<&str> = content.split_whitespace().collect();
    if parts.len() < 4 {
        return Err(ParseError::new("invalid loadavg format"));
    }

    let load1 = parts[0]
        .parse()
        .map_err(|_| ParseError::new("invalid load1"))?;
    let load5 = parts[1]
        .parse()
        .map_err(|_| ParseError::new("invalid load5"))?;
    let load15 = parts[2]
        .parse()
        .map_err(|_| ParseError::new("invalid load15"))?;

    // running/total
    let (running, total) = if let Some((r, t)) = parts[3].split_once('/') {
        (r.parse().unwrap_or(0), t.parse().unwrap_or(0))
    } else {
        (0, 0)
    };

    Ok(LoadAvg {
        load1,
        load5,
        load15,
        running,
        total,
    })
}

/// `/proc/meminfo` fields exported as gauges, in kB as the kernel reports them.
pub const MEMINFO_FIELDS: &[(&str, &str)] = &[
    ("MemTotal", "mem_total"),
    ("MemFree", "mem_free"),
    ("MemAvailable", "mem_available"),
    ("Buffers", "buffers"),
    ("Cached", "cached"),
    ("SwapCached", "swap_cached"),
    ("Active", "active"),
    ("Inactive", "inactive"),
    ("SwapTotal", "swap_total"),
    ("SwapFree", "swap_free"),
    ("Dirty", "dirty"),
    ("Writeback", "writeback"),
    ("Slab", "slab"),
    ("SReclaimable", "s_reclaimable"),
];

/// Parses `/proc/meminfo` into `(field, kB)` pairs for [`MEMINFO_FIELDS`],
/// in table order. Fields missing from the input are skipped.
pub fn parse_meminfo(content: &str) -> Result<Vec<(&'static str, u64)>, ParseError> {
    let mut values: Vec<Option<u64>> = vec![None; MEMINFO_FIELDS.len()];

    for line in content.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let Some(idx) = MEMINFO_FIELDS.iter().position(|(k, _)| *k == key) else {
            continue;
        };
        let value = rest
            .split_whitespace()
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| ParseError::new(format!("invalid {}", key)))?;
        values[idx] = Some(value);
    }

    if values.iter().all(Option::is_none) {
        return Err(ParseError::new("no known meminfo fields"));
    }

    Ok(MEMINFO_FIELDS
        .iter()
        .zip(values)
        .filter_map(|((_, name), v)| v.map(|v| (*name, v)))
        .collect())
}
