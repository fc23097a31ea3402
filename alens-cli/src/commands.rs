// SPDX-License-Identifier: AGPL-3.0-or-later
//! CLI command implementations

use alens_core::{
    custom, AlensError, AlensResult, AttributeId, AttributeKind, AttributeValue, DriverRegistry,
    FileInfo, FileType, Permissions, ATTRIBUTES,
};
use alens_drivers::DriverConfig;
use chrono::{DateTime, Utc};
use console::style;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabled::{Table, Tabled};
use tracing::debug;
use url::Url;

/// Shared state for one invocation
pub struct Context {
    registry: Arc<DriverRegistry>,
    json: bool,
}

impl Context {
    pub fn new(config: Option<&Path>, json: bool) -> AlensResult<Self> {
        let config = match config {
            Some(path) => DriverConfig::load(path)?,
            None => DriverConfig::load_default()?,
        };
        Ok(Self {
            registry: alens_drivers::default_registry(&config),
            json,
        })
    }

    fn open(&self, target: &str) -> AlensResult<FileInfo> {
        let uri = parse_target(target)?;
        debug!(%uri, "Opening");
        FileInfo::new(&self.registry, uri)
    }
}

/// Turn a command-line target into a URI
/// Supports:
/// - scheme://... - explicit URI
/// - /absolute/path - local absolute path
/// - relative/path - local relative path
fn parse_target(target: &str) -> AlensResult<Url> {
    if target.contains("://") {
        return Url::parse(target).map_err(|e| AlensError::InvalidUri(format!("{}: {}", target, e)));
    }

    let path = if target.starts_with('/') {
        PathBuf::from(target)
    } else {
        std::env::current_dir()?.join(target)
    };

    // Canonicalize if exists, otherwise use as-is
    let canonical = path.canonicalize().unwrap_or(path);
    Url::from_file_path(&canonical)
        .map_err(|_| AlensError::InvalidUri(canonical.display().to_string()))
}

/// Look up an attribute by name, `custom::N` or raw number
fn parse_attribute(name: &str) -> AlensResult<AttributeId> {
    if let Some(id) = AttributeId::from_name(name) {
        return Ok(id);
    }
    name.strip_prefix("custom::")
        .unwrap_or(name)
        .parse::<u32>()
        .ok()
        .and_then(|raw| AttributeId::try_from(raw).ok())
        .ok_or_else(|| AlensError::UnknownAttribute(name.to_string()))
}

/// Format a timestamp for display
fn format_time(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|s| DateTime::<Utc>::from_timestamp(s, 0))
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| secs.to_string())
}

/// Render a value for humans, with per-attribute formatting
fn format_value(id: AttributeId, value: &AttributeValue, human: bool) -> String {
    match (id, value) {
        (
            AttributeId::STANDARD_SIZE
            | AttributeId::STANDARD_ALLOCATED_SIZE
            | AttributeId::FILESYSTEM_SIZE
            | AttributeId::FILESYSTEM_FREE
            | AttributeId::FILESYSTEM_USED,
            AttributeValue::U64(size),
        ) if human => bytesize::ByteSize(*size).to_string(),
        (
            AttributeId::TIME_MODIFIED
            | AttributeId::TIME_ACCESS
            | AttributeId::TIME_CHANGED
            | AttributeId::TIME_CREATED,
            AttributeValue::U64(secs),
        ) => format!("{} ({})", secs, format_time(*secs)),
        (AttributeId::UNIX_MODE, AttributeValue::U32(mode)) => {
            format!("{:o} ({})", mode, Permissions::new(*mode))
        }
        (AttributeId::STANDARD_TYPE, AttributeValue::U32(raw)) => {
            format!("{:?}", FileType::from_raw(*raw))
        }
        _ => value.to_string(),
    }
}

fn kind_name(id: AttributeId) -> String {
    id.info()
        .map(|info| info.kind.to_string())
        .unwrap_or_else(|| "custom".to_string())
}

/// Well-known attributes followed by the path-convention ones
fn all_attributes() -> impl Iterator<Item = AttributeId> {
    AttributeId::well_known().chain(custom::PATH_ATTRIBUTES.iter().map(|(id, _)| *id))
}

fn print_json<T: Serialize>(value: &T) -> AlensResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| AlensError::InvalidValue {
            attribute: "json".to_string(),
            message: e.to_string(),
        })?;
    println!("{}", text);
    Ok(())
}

#[derive(Tabled)]
struct AttributeRow {
    #[tabled(rename = "Attribute")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Serialize)]
struct AttributeReport {
    attribute: String,
    found: bool,
    value: AttributeValue,
}

/// Show every attribute of a file
pub fn stat(ctx: &Context, target: &str, all: bool, human: bool) -> AlensResult<()> {
    let mut info = ctx.open(target)?;
    if !info.is_initialized() {
        return Err(info.last_error().into());
    }

    let mut reports = Vec::new();
    for id in all_attributes() {
        let (value, found) = info.attribute(id);
        if found || all {
            reports.push((id, AttributeReport {
                attribute: id.to_string(),
                found,
                value,
            }));
        }
    }

    if ctx.json {
        let reports: Vec<&AttributeReport> = reports.iter().map(|(_, r)| r).collect();
        return print_json(&reports);
    }

    println!("{}", style(info.uri()).bold());
    let rows: Vec<AttributeRow> = reports
        .iter()
        .map(|(id, report)| AttributeRow {
            name: report.attribute.clone(),
            kind: kind_name(*id),
            value: if report.found {
                format_value(*id, &report.value, human)
            } else {
                style("-").dim().to_string()
            },
        })
        .collect();
    println!("{}", Table::new(rows));
    Ok(())
}

/// Print selected attributes
pub fn get(ctx: &Context, target: &str, names: &[String]) -> AlensResult<()> {
    let ids = names
        .iter()
        .map(|name| parse_attribute(name))
        .collect::<AlensResult<Vec<_>>>()?;
    let mut info = ctx.open(target)?;

    let mut reports = Vec::new();
    for id in ids {
        let (value, found) = info.attribute(id);
        if !found {
            debug!(attribute = %id, error = %info.last_error(), "Lookup failed");
        }
        reports.push((id, AttributeReport {
            attribute: id.to_string(),
            found,
            value,
        }));
    }

    if ctx.json {
        let reports: Vec<&AttributeReport> = reports.iter().map(|(_, r)| r).collect();
        return print_json(&reports);
    }

    for (id, report) in &reports {
        let value = format_value(*id, &report.value, false);
        if report.found {
            println!("{}: {}", report.attribute, value);
        } else {
            println!("{}: {}", report.attribute, style(format!("{} (default)", value)).dim());
        }
    }
    Ok(())
}

/// Set one attribute and flush it to the backend
pub fn set(ctx: &Context, target: &str, name: &str, text: &str) -> AlensResult<()> {
    let id = parse_attribute(name)?;
    let kind = id.info().map(|info| info.kind).unwrap_or(AttributeKind::String);
    let value = AttributeValue::parse(kind, text).map_err(|e| match e {
        AlensError::InvalidValue { message, .. } => AlensError::InvalidValue {
            attribute: id.to_string(),
            message,
        },
        other => other,
    })?;

    let mut info = ctx.open(target)?;
    info.set_attribute(id, value.clone());
    if !info.flush() {
        return Err(info.last_error().into());
    }

    if ctx.json {
        return print_json(&AttributeReport {
            attribute: id.to_string(),
            found: true,
            value,
        });
    }
    println!(
        "{} {} = {}",
        style("Set").green(),
        id,
        format_value(id, &value, false)
    );
    Ok(())
}

/// Fresh existence check
pub fn exists(ctx: &Context, target: &str) -> AlensResult<bool> {
    let info = ctx.open(target)?;
    let exists = info.exists();

    if ctx.json {
        print_json(&serde_json::json!({ "uri": info.uri().as_str(), "exists": exists }))?;
    } else if exists {
        println!("{} {}", style("exists").green(), info.uri());
    } else {
        println!("{} {}", style("missing").red(), info.uri());
    }
    Ok(exists)
}

/// Permissions through a content handle
pub fn perms(ctx: &Context, target: &str) -> AlensResult<()> {
    let mut info = ctx.open(target)?;
    let permissions = info.permissions();
    if permissions.is_empty() && !info.last_error().is_none() {
        return Err(info.last_error().into());
    }

    if ctx.json {
        return print_json(&permissions);
    }
    println!("{} ({:04o})", permissions, permissions.mode);
    Ok(())
}

/// List registered schemes
pub fn schemes(ctx: &Context) -> AlensResult<()> {
    let schemes = ctx.registry.schemes();
    if ctx.json {
        return print_json(&schemes);
    }

    println!("Registered schemes:");
    for scheme in schemes {
        println!("  {}", style(scheme).cyan());
    }
    Ok(())
}

#[derive(Tabled, Serialize)]
struct AttrEntry {
    #[tabled(rename = "ID")]
    id: u32,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Default")]
    default: String,
}

/// List the attribute identity space
pub fn attrs(ctx: &Context) -> AlensResult<()> {
    let mut entries: Vec<AttrEntry> = ATTRIBUTES
        .iter()
        .map(|info| AttrEntry {
            id: info.id.raw(),
            name: info.name.to_string(),
            kind: info.kind.to_string(),
            default: info.default_value().to_string(),
        })
        .collect();
    entries.extend(custom::PATH_ATTRIBUTES.iter().map(|(id, name)| AttrEntry {
        id: id.raw(),
        name: name.to_string(),
        kind: "custom".to_string(),
        default: String::new(),
    }));

    if ctx.json {
        return print_json(&entries);
    }
    println!("{}", Table::new(entries));
    Ok(())
}
