use std::path::{Component, Path, PathBuf};

use anyhow::{Result, bail};

/// Fixed identifiers for the modulation workbook.
///
/// The operational export always carries the same sheet and header names,
/// so these are constants rather than CLI parameters. Headers in the file
/// may carry stray whitespace; the loader trims them before matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetSchema {
    pub sheet_name: &'static str,
    pub delivery_date_column: &'static str,
    pub business_code_column: &'static str,
    pub entity_key_column: &'static str,
    pub target_column: &'static str,
    pub client_column: &'static str,
    pub vehicle_column: &'static str,
    pub order_ref_column: &'static str,
    pub reason_column: &'static str,
    pub business_code: &'static str,
}

pub const MODULATION_SHEET: SheetSchema = SheetSchema {
    sheet_name: "3.30.8",
    delivery_date_column: "Entrega",
    business_code_column: "DPS",
    entity_key_column: "CONCATENADO",
    target_column: "MODULACION",
    client_column: "CLIENTE",
    vehicle_column: "VEHICULO",
    order_ref_column: "PEDIDO",
    reason_column: "MOTIVO",
    business_code: "88",
};

impl SheetSchema {
    /// Columns that must be present for the pipeline to run at all.
    /// Client, vehicle, order and reason columns are optional detail.
    #[must_use]
    pub const fn required_columns(&self) -> [&'static str; 4] {
        [
            self.delivery_date_column,
            self.business_code_column,
            self.entity_key_column,
            self.target_column,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimePaths {
    pub home_dir: PathBuf,
    pub cwd: PathBuf,
    pub out_dir: PathBuf,
}

pub fn resolve_runtime_paths(
    home_dir: &Path,
    cwd: &Path,
    out_dir_override: Option<&Path>,
) -> Result<RuntimePaths> {
    if !home_dir.is_absolute() {
        bail!("home_dir must be absolute: {}", home_dir.display());
    }
    if !cwd.is_absolute() {
        bail!("cwd must be absolute: {}", cwd.display());
    }

    let home_dir = normalize_lexical(home_dir);
    let cwd = normalize_lexical(cwd);
    let out_dir = match out_dir_override {
        Some(path) => resolve_user_path(path, &home_dir, &cwd)?,
        None => home_dir.join(".modrep").join("output"),
    };

    Ok(RuntimePaths {
        home_dir,
        cwd,
        out_dir: normalize_lexical(&out_dir),
    })
}

fn resolve_user_path(path: &Path, home_dir: &Path, cwd: &Path) -> Result<PathBuf> {
    let expanded = expand_tilde(path, home_dir)?;
    let resolved = if expanded.is_absolute() {
        expanded
    } else {
        cwd.join(expanded)
    };

    Ok(normalize_lexical(&resolved))
}

fn expand_tilde(path: &Path, home_dir: &Path) -> Result<PathBuf> {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => {
            let mut expanded = home_dir.to_path_buf();
            for component in components {
                expanded.push(component.as_os_str());
            }
            Ok(expanded)
        }
        Some(Component::Normal(first))
            if first
                .to_str()
                .is_some_and(|segment| segment.starts_with('~')) =>
        {
            bail!(
                "unsupported home expansion syntax (only `~` and `~/...` are supported): {}",
                path.display()
            )
        }
        _ => Ok(path.to_path_buf()),
    }
}

fn normalize_lexical(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component.as_os_str());
                }
            }
            _ => normalized.push(component.as_os_str()),
        }
    }

    normalized
}
