use crate::arm::models::{
    GenericResource, KeyPermission, ResourceGroup, SecretPermission, Tags, Vault,
};
use serde::Serialize;
use std::fmt::Display;

pub const NO_TAGS: &str = "No tags yet";
pub const NO_ACCESS_POLICIES: &str = "No access policies defined";
const MISSING: &str = "-";

/// Output format configuration
#[derive(Clone, Debug)]
pub struct OutputFormat {
    pub raw: bool,
}

/// Rows for listing tables: name, location, id
pub trait TableRow {
    fn table_row(&self) -> Vec<String>;
}

impl TableRow for Vault {
    fn table_row(&self) -> Vec<String> {
        vec![
            self.display_name().to_string(),
            self.location.clone(),
            or_missing(self.id.as_deref()),
        ]
    }
}

impl TableRow for GenericResource {
    fn table_row(&self) -> Vec<String> {
        vec![
            or_missing(self.name.as_deref()),
            or_missing(self.location.as_deref()),
            or_missing(self.id.as_deref()),
        ]
    }
}

impl TableRow for ResourceGroup {
    fn table_row(&self) -> Vec<String> {
        vec![
            or_missing(self.name.as_deref()),
            self.location.clone(),
            or_missing(self.id.as_deref()),
        ]
    }
}

fn or_missing(value: Option<&str>) -> String {
    value.unwrap_or(MISSING).to_string()
}

fn serde_name<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(name)) => name,
        _ => MISSING.to_string(),
    }
}

fn join_permissions<T: Display>(permissions: &[T]) -> String {
    if permissions.is_empty() {
        return "none".to_string();
    }
    permissions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_tags(tags: Option<&Tags>) -> String {
    match tags {
        Some(tags) if !tags.is_empty() => tags
            .iter()
            .map(|(k, v)| format!("\t\t{k} = {v}"))
            .collect::<Vec<_>>()
            .join("\n"),
        _ => format!("\t\t{NO_TAGS}"),
    }
}

/// Human-readable dump of a vault.
///
/// Never fails: absent tags and policies are replaced by placeholder text.
pub fn render_vault(vault: &Vault) -> String {
    let properties = &vault.properties;

    let access_policies = match properties.access_policies.first() {
        Some(policy) => format!(
            "\t\tObject ID: {}\n\t\tKey permissions: {}\n\t\tSecret permissions: {}",
            policy.object_id,
            join_permissions::<KeyPermission>(&policy.permissions.keys),
            join_permissions::<SecretPermission>(&policy.permissions.secrets),
        ),
        None => format!("\t\t{NO_ACCESS_POLICIES}"),
    };

    let lines = [
        format!("Key vault '{}'", vault.display_name()),
        format!("\tID: {}", or_missing(vault.id.as_deref())),
        format!("\tType: {}", or_missing(vault.resource_type.as_deref())),
        format!("\tLocation: {}", vault.location),
        format!("\tTags:\n{}", render_tags(vault.tags.as_ref())),
        format!(
            "\tSku: {} - {}",
            serde_name(&properties.sku.name),
            serde_name(&properties.sku.family)
        ),
        format!("\tAccess Policies:\n{access_policies}"),
    ];
    lines.join("\n")
}

impl OutputFormat {
    pub fn new(raw: bool) -> Self {
        Self { raw }
    }

    /// Print tabular data - either raw (tab-separated) or formatted (column-aligned)
    pub fn print_table<T>(&self, data: &[Vec<T>])
    where
        T: Display + AsRef<str>,
    {
        for line in self.format_table(data) {
            println!("{line}");
        }
    }

    /// Print one row per item
    pub fn print_rows<R: TableRow>(&self, items: &[R]) {
        let data: Vec<Vec<String>> = items.iter().map(TableRow::table_row).collect();
        self.print_table(&data);
    }

    /// Print single-column data
    pub fn print_list<T>(&self, items: &[T])
    where
        T: Display,
    {
        for item in items {
            println!("{item}");
        }
    }

    fn format_table<T>(&self, data: &[Vec<T>]) -> Vec<String>
    where
        T: Display + AsRef<str>,
    {
        if data.is_empty() {
            return Vec::new();
        }

        if self.raw {
            // Raw output: tab-separated values
            return data
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|cell| cell.as_ref())
                        .collect::<Vec<_>>()
                        .join("\t")
                })
                .collect();
        }

        // Column-aligned like `column -t`
        let num_cols = data.iter().map(Vec::len).max().unwrap_or(0);
        let mut col_widths = vec![0; num_cols];

        for row in data {
            for (i, cell) in row.iter().enumerate() {
                col_widths[i] = col_widths[i].max(cell.as_ref().len());
            }
        }

        data.iter()
            .map(|row| {
                let formatted_cells: Vec<String> = row
                    .iter()
                    .enumerate()
                    .map(|(i, cell)| {
                        if i == row.len() - 1 {
                            // Last column - no padding needed
                            cell.to_string()
                        } else {
                            format!("{:<width$}", cell.as_ref(), width = col_widths[i])
                        }
                    })
                    .collect();
                formatted_cells.join("  ")
            })
            .collect()
    }
}
