use metacpan_client::{
    entity::{Author, Distribution, DownloadUrl, File, Release},
    MetaCpanError, Result,
};
use nu_ansi_term::Color::{Blue, Cyan, Green, LightRed};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::utils::Colored;

/// Label/value pairs shown for an entity in human-readable output.
pub trait Describe {
    fn rows(&self) -> Vec<(&'static str, String)>;
}

fn push(rows: &mut Vec<(&'static str, String)>, label: &'static str, value: Option<&str>) {
    if let Some(value) = value {
        rows.push((label, value.to_string()));
    }
}

fn push_list(rows: &mut Vec<(&'static str, String)>, label: &'static str, values: &[String]) {
    if !values.is_empty() {
        rows.push((label, values.join(", ")));
    }
}

impl Describe for Author {
    fn rows(&self) -> Vec<(&'static str, String)> {
        let mut rows = vec![("PAUSE id", self.pauseid.clone())];
        push(&mut rows, "Name", self.name.as_deref());
        push_list(&mut rows, "Email", &self.email);
        push_list(&mut rows, "Website", &self.website);
        let location: Vec<String> = [&self.city, &self.region, &self.country]
            .into_iter()
            .flatten()
            .cloned()
            .collect();
        if !location.is_empty() {
            rows.push(("Location", location.join(", ")));
        }
        rows
    }
}

impl Describe for Release {
    fn rows(&self) -> Vec<(&'static str, String)> {
        let mut rows = vec![("Release", self.name.clone())];
        push(&mut rows, "Version", self.version.as_deref());
        push(&mut rows, "Author", self.author.as_deref());
        push(&mut rows, "Abstract", self.abstract_.as_deref());
        push(&mut rows, "Status", self.status.as_deref());
        push(&mut rows, "Date", self.date.as_deref());
        push_list(&mut rows, "License", &self.license);
        push(&mut rows, "Download", self.download_url.as_deref());
        if let Some(tests) = &self.tests {
            rows.push((
                "Tests",
                format!(
                    "{} pass, {} fail, {} na, {} unknown",
                    tests.pass, tests.fail, tests.na, tests.unknown
                ),
            ));
        }
        let requires = self.runtime_requires().count();
        if requires > 0 {
            rows.push(("Requires", format!("{requires} modules")));
        }
        rows
    }
}

impl Describe for File {
    fn rows(&self) -> Vec<(&'static str, String)> {
        let mut rows = Vec::new();
        push(&mut rows, "Module", self.documentation.as_deref());
        push(&mut rows, "Version", self.version.as_deref());
        push(&mut rows, "Abstract", self.abstract_.as_deref());
        push(&mut rows, "Release", self.release.as_deref());
        push(&mut rows, "Author", self.author.as_deref());
        push(&mut rows, "Path", self.path.as_deref());
        rows
    }
}

impl Describe for Distribution {
    fn rows(&self) -> Vec<(&'static str, String)> {
        let mut rows = vec![("Distribution", self.name.clone())];
        if let Some(river) = &self.river {
            rows.push((
                "River",
                format!(
                    "{} dependents ({} direct), bucket {}",
                    river.total, river.immediate, river.bucket
                ),
            ));
        }
        rows
    }
}

impl Describe for DownloadUrl {
    fn rows(&self) -> Vec<(&'static str, String)> {
        let mut rows = vec![("URL", self.download_url.clone())];
        push(&mut rows, "Version", self.version.as_deref());
        push(&mut rows, "Status", self.status.as_deref());
        push(&mut rows, "SHA-256", self.checksum_sha256.as_deref());
        rows
    }
}

pub fn to_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String> {
    let out = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    out.map_err(|err| MetaCpanError::InvalidArgument(format!("serializing output: {err}")))
}

pub fn print_entity<T: Describe + Serialize>(entity: &T, json: bool) -> Result<()> {
    if json {
        println!("{}", to_json(entity, true)?);
        return Ok(());
    }

    let rows = entity.rows();
    let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    for (label, value) in rows {
        info!("{}: {}", Colored(Blue, format!("{label:>width$}")), value);
    }
    Ok(())
}

/// One line per search hit: the document id followed by the most
/// identifying fields of its source.
pub fn hit_line(hit: &Value) -> String {
    let source = hit
        .get("_source")
        .or_else(|| hit.get("fields"))
        .unwrap_or(hit);

    let pick = |key: &str| {
        match source.get(key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Array(items)) => items.first().and_then(Value::as_str).map(String::from),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    };

    let name = pick("name")
        .or_else(|| pick("pauseid"))
        .or_else(|| pick("documentation"))
        .or_else(|| hit.get("_id").and_then(Value::as_str).map(String::from))
        .unwrap_or_else(|| "?".to_string());

    let mut line = format!("{}", Colored(Cyan, name));
    if let Some(version) = pick("version") {
        line.push_str(&format!(" {}", Colored(LightRed, version)));
    }
    if let Some(author) = pick("author") {
        line.push_str(&format!(" {}", Colored(Green, author)));
    }
    if let Some(abstract_) = pick("abstract") {
        line.push_str(&format!(" - {abstract_}"));
    }
    line
}
