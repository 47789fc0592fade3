//! # Preset Binding Resolution
//!
//! A preset binds together a task pool, a profile, and calendar logic by
//! `(id, version)`. Each reference must resolve to exactly the document it
//! names in that kind's library directory.
//!
//! ## Key Conventions
//!
//! | Kind | Binding key | Ref id / version keys | Library version keys |
//! |---|---|---|---|
//! | TaskPool | `task_pool_ref` | `task_pool_id` / `task_pool_version` | `version` |
//! | Profile | `profile_ref` | `profile_id` / `profile_version` | `version` |
//! | CalendarLogic | `calendar_logic_ref` | `calendar_id` / `calendar_version`, `version` | `calendar_version`, `version` |
//! | StandardsBundle | `standards_bundle_ref` | not resolved | not resolved |
//!
//! ## Matching
//!
//! A library document matches iff its id field is the string `id` and at
//! least one accepted version field is the string `version`. No coercion:
//! a numeric `version: 1.0` never matches `"1.0"`. Library files are
//! searched in file-name order and the first match wins. Further matches
//! are reported as warnings and never change the outcome.
//!
//! Every preset is processed; one preset's parse failure never hides
//! another preset's result.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use packcheck_core::error::json_type_name;
use packcheck_core::{load_yaml, summarize, CheckResult, PackLayout, ParseError};

/// Stage name reported by the runner.
pub const CHECK_NAME: &str = "presets.bindings";

const FAILURE_LIMIT: usize = 6;
const WARNING_LIMIT: usize = 6;

/// The kinds of library document a preset can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// `task_pool_ref`, resolved against the task pool library.
    TaskPool,
    /// `profile_ref`, resolved against the profile library.
    Profile,
    /// `calendar_logic_ref`, resolved against the calendar library.
    CalendarLogic,
    /// `standards_bundle_ref`, optional and recorded by presence only.
    StandardsBundle,
}

impl ReferenceKind {
    /// Every kind, in report order.
    pub const ALL: [ReferenceKind; 4] = [
        ReferenceKind::TaskPool,
        ReferenceKind::Profile,
        ReferenceKind::CalendarLogic,
        ReferenceKind::StandardsBundle,
    ];

    /// Key of this reference inside a preset's `bindings` block.
    pub fn binding_key(self) -> &'static str {
        match self {
            Self::TaskPool => "task_pool_ref",
            Self::Profile => "profile_ref",
            Self::CalendarLogic => "calendar_logic_ref",
            Self::StandardsBundle => "standards_bundle_ref",
        }
    }

    /// Id field name, shared by the reference and the library document.
    pub fn id_key(self) -> &'static str {
        match self {
            Self::TaskPool => "task_pool_id",
            Self::Profile => "profile_id",
            Self::CalendarLogic => "calendar_id",
            Self::StandardsBundle => "standards_bundle_id",
        }
    }

    /// Accepted version field names inside the reference, in priority order.
    pub fn ref_version_keys(self) -> &'static [&'static str] {
        match self {
            Self::TaskPool => &["task_pool_version"],
            Self::Profile => &["profile_version"],
            Self::CalendarLogic => &["calendar_version", "version"],
            Self::StandardsBundle => &[],
        }
    }

    /// Accepted version field names inside a library document.
    pub fn library_version_keys(self) -> &'static [&'static str] {
        match self {
            Self::TaskPool | Self::Profile => &["version"],
            Self::CalendarLogic => &["calendar_version", "version"],
            Self::StandardsBundle => &[],
        }
    }

    /// Whether references of this kind are parsed and must resolve. Other
    /// kinds are only recorded as declared; their contents are never read.
    pub fn is_required(self) -> bool {
        !matches!(self, Self::StandardsBundle)
    }

    /// Library directory for this kind, or `None` if the kind is never
    /// resolved.
    pub fn library_dir(self, layout: &PackLayout) -> Option<&Path> {
        match self {
            Self::TaskPool => Some(&layout.task_pool_dir),
            Self::Profile => Some(&layout.profile_dir),
            Self::CalendarLogic => Some(&layout.calendar_dir),
            Self::StandardsBundle => None,
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binding_key())
    }
}

/// A complete `(kind, id, version)` pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    /// Library the reference points into.
    pub kind: ReferenceKind,
    /// Value of the kind's id field.
    pub id: String,
    /// Value of the first accepted version field present.
    pub version: String,
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} {})", self.kind, self.id, self.version)
    }
}

/// A declared reference, which may lack its id or version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RefSlot {
    /// Both id and version are present.
    Complete(Reference),
    /// The id, the version, or both are missing.
    Incomplete {
        /// The id, if given.
        id: Option<String>,
        /// The version, if given.
        version: Option<String>,
    },
    /// A non-empty value of an optional kind, whatever its shape.
    Declared,
}

/// The references a preset declares, at most one per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Binding {
    slots: BTreeMap<ReferenceKind, RefSlot>,
}

impl Binding {
    /// The declared slot for `kind`, if any.
    pub fn get(&self, kind: ReferenceKind) -> Option<&RefSlot> {
        self.slots.get(&kind)
    }

    /// Declare a slot, replacing any previous one of the same kind.
    pub fn insert(&mut self, kind: ReferenceKind, slot: RefSlot) {
        self.slots.insert(kind, slot);
    }

    fn from_value(value: Option<&Value>) -> Result<Self, ParseError> {
        let map = match value {
            None | Some(Value::Null) => return Ok(Self::default()),
            Some(Value::Object(map)) => map,
            Some(_) => {
                return Err(ParseError::NotAMapping {
                    context: "bindings".to_string(),
                })
            }
        };
        let mut binding = Self::default();
        for kind in ReferenceKind::ALL {
            let field = format!("bindings.{}", kind.binding_key());
            let raw = match map.get(kind.binding_key()) {
                None | Some(Value::Null) => continue,
                Some(Value::String(s)) if s.is_empty() => continue,
                Some(Value::Object(m)) if m.is_empty() => continue,
                Some(raw) => raw,
            };
            if !kind.is_required() {
                binding.insert(kind, RefSlot::Declared);
                continue;
            }
            let slot_map = match raw {
                Value::Object(m) => m,
                other => {
                    return Err(ParseError::WrongType {
                        field,
                        expected: "mapping",
                        found: json_type_name(other),
                    })
                }
            };
            let id = optional_string(slot_map, kind.id_key(), &field)?;
            let mut version = None;
            for key in kind.ref_version_keys() {
                if let Some(v) = optional_string(slot_map, key, &field)? {
                    version = Some(v);
                    break;
                }
            }
            let slot = match (id, version) {
                (Some(id), Some(version)) => RefSlot::Complete(Reference { kind, id, version }),
                (id, version) => RefSlot::Incomplete { id, version },
            };
            binding.insert(kind, slot);
        }
        Ok(binding)
    }
}

/// A parsed preset document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preset {
    /// The preset's own id.
    pub preset_id: Option<String>,
    /// The preset's own version.
    pub version: Option<String>,
    /// Declared references.
    pub binding: Binding,
    /// Header fields of the wrong type. They play no part in resolution,
    /// so they are reported as warnings and read as absent.
    pub header_warnings: Vec<String>,
}

impl Preset {
    /// Parse a decoded preset document.
    ///
    /// # Errors
    ///
    /// `NotAMapping` if the document or its `bindings` block is not a
    /// mapping; `WrongType` if a required reference has a field of the
    /// wrong type.
    pub fn from_value(value: &Value) -> Result<Self, ParseError> {
        let map = value.as_object().ok_or_else(|| ParseError::NotAMapping {
            context: "preset".to_string(),
        })?;
        let mut header_warnings = Vec::new();
        let mut header = |key: &str| {
            optional_string(map, key, "").unwrap_or_else(|e| {
                header_warnings.push(e.to_string());
                None
            })
        };
        let preset_id = header("preset_id");
        let version = header("version");
        Ok(Self {
            preset_id,
            version,
            binding: Binding::from_value(map.get("bindings"))?,
            header_warnings,
        })
    }
}

/// Read `key` as an optional non-empty string; any other type is an error.
fn optional_string(
    map: &Map<String, Value>,
    key: &str,
    parent: &str,
) -> Result<Option<String>, ParseError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ParseError::WrongType {
            field: if parent.is_empty() {
                key.to_string()
            } else {
                format!("{parent}.{key}")
            },
            expected: "string",
            found: json_type_name(other),
        }),
    }
}

/// Why a reference did not resolve.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum UnresolvedReason {
    /// The preset does not declare this reference.
    #[error("reference not declared")]
    Absent,

    /// The reference lacks its id or version; no search is attempted.
    #[error("incomplete reference (id: {}, version: {})", .id.as_deref().unwrap_or("-"), .version.as_deref().unwrap_or("-"))]
    Incomplete {
        /// The id, if given.
        id: Option<String>,
        /// The version, if given.
        version: Option<String>,
    },

    /// The kind's library directory does not exist.
    #[error("library directory not found: {}", .dir.display())]
    LibraryMissing {
        /// Pack-relative library directory.
        dir: PathBuf,
    },

    /// The kind's library directory could not be listed.
    #[error("cannot read library directory {}: {reason}", .dir.display())]
    LibraryUnreadable {
        /// Pack-relative library directory.
        dir: PathBuf,
        /// The I/O error.
        reason: String,
    },

    /// No library document carries this `(id, version)`.
    #[error("no document with ({id} {version}) in {}", .dir.display())]
    NoMatch {
        /// Requested id.
        id: String,
        /// Requested version.
        version: String,
        /// Pack-relative library directory searched.
        dir: PathBuf,
    },
}

/// Resolution outcome of one declared or required reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RefOutcome {
    /// Pack-relative path of the first matching library document.
    Resolved(PathBuf),
    /// Required, but no document could be chosen.
    Unresolved(UnresolvedReason),
    /// Declared, but this kind is never resolved.
    Skipped,
}

/// Outcome for one preset file.
#[derive(Debug)]
pub struct PresetOutcome {
    /// Preset file name.
    pub file: String,
    /// Per-kind outcomes in [`ReferenceKind::ALL`] order, or the reason the
    /// preset could not be read.
    pub result: Result<Vec<(ReferenceKind, RefOutcome)>, ParseError>,
}

impl PresetOutcome {
    /// A preset is bound iff it parsed and every required reference resolved.
    pub fn is_bound(&self) -> bool {
        match &self.result {
            Ok(refs) => refs
                .iter()
                .all(|(kind, o)| !kind.is_required() || matches!(o, RefOutcome::Resolved(_))),
            Err(_) => false,
        }
    }

    /// One line per failure, prefixed with the preset file name.
    pub fn failures(&self) -> Vec<String> {
        match &self.result {
            Err(e) => vec![format!("{}: {}", self.file, e.reason())],
            Ok(refs) => refs
                .iter()
                .filter_map(|(kind, outcome)| match outcome {
                    RefOutcome::Unresolved(reason) if kind.is_required() => {
                        Some(format!("{}: cannot resolve {kind}: {reason}", self.file))
                    }
                    _ => None,
                })
                .collect(),
        }
    }
}

/// Aggregate outcome of the binding stage.
#[derive(Debug, Default)]
pub struct BindingReport {
    /// Per-preset outcomes, sorted by file name.
    pub presets: Vec<PresetOutcome>,
    /// Duplicate matches and skipped library documents, sorted.
    pub warnings: Vec<String>,
    /// Set when the stage could not start.
    pub unavailable: Option<String>,
}

impl BindingReport {
    /// PASS iff the stage ran, found presets, and bound all of them.
    pub fn is_pass(&self) -> bool {
        self.unavailable.is_none()
            && !self.presets.is_empty()
            && self.presets.iter().all(PresetOutcome::is_bound)
    }

    /// Every failure line, in preset order.
    pub fn failures(&self) -> Vec<String> {
        self.presets.iter().flat_map(PresetOutcome::failures).collect()
    }

    /// Summarize as the `presets.bindings` stage result.
    pub fn to_check_result(&self) -> CheckResult {
        if let Some(reason) = &self.unavailable {
            return CheckResult::fail(CHECK_NAME, reason.clone());
        }
        let warnings = if self.warnings.is_empty() {
            String::new()
        } else {
            format!(" | {}", summarize("Warnings", &self.warnings, WARNING_LIMIT, "; "))
        };
        let failures = self.failures();
        if failures.is_empty() {
            CheckResult::pass(
                CHECK_NAME,
                format!("Validated bindings for {} preset(s){warnings}", self.presets.len()),
            )
        } else {
            CheckResult::fail(
                CHECK_NAME,
                format!(
                    "{}{warnings}",
                    summarize("Preset failures", &failures, FAILURE_LIMIT, " | ")
                ),
            )
        }
    }
}

/// A parsed library document.
#[derive(Debug)]
struct LibraryDoc {
    rel: PathBuf,
    fields: Map<String, Value>,
}

impl LibraryDoc {
    fn matches(&self, kind: ReferenceKind, reference: &Reference) -> bool {
        let id_matches = self.fields.get(kind.id_key()).and_then(Value::as_str)
            == Some(reference.id.as_str());
        id_matches
            && kind
                .library_version_keys()
                .iter()
                .any(|key| self.fields.get(*key).and_then(Value::as_str) == Some(reference.version.as_str()))
    }
}

type Library = Result<Vec<LibraryDoc>, UnresolvedReason>;

/// Resolves every preset's references against the pack's libraries.
///
/// Each library directory is read once, on first use.
pub struct BindingResolver {
    root: PathBuf,
    layout: PackLayout,
    libraries: HashMap<ReferenceKind, Library>,
    warnings: BTreeSet<String>,
}

impl BindingResolver {
    /// Resolver for the pack at `root`. Nothing is read until resolution.
    pub fn new(root: impl Into<PathBuf>, layout: &PackLayout) -> Self {
        Self {
            root: root.into(),
            layout: layout.clone(),
            libraries: HashMap::new(),
            warnings: BTreeSet::new(),
        }
    }

    /// Resolve every preset in the preset library.
    pub fn resolve_all(mut self) -> BindingReport {
        let preset_dir = self.layout.preset_dir.clone();
        let files = match yaml_files(&self.root.join(&preset_dir)) {
            Ok(Some(files)) => files,
            Ok(None) => {
                return BindingReport {
                    unavailable: Some(format!("{} not found", preset_dir.display())),
                    ..BindingReport::default()
                }
            }
            Err(e) => {
                return BindingReport {
                    unavailable: Some(format!("cannot read {}: {e}", preset_dir.display())),
                    ..BindingReport::default()
                }
            }
        };
        if files.is_empty() {
            return BindingReport {
                unavailable: Some(format!(
                    "No preset YAML files found in {}",
                    preset_dir.display()
                )),
                ..BindingReport::default()
            };
        }

        let mut presets = Vec::with_capacity(files.len());
        for (file, path) in files {
            let result = load_yaml(&path)
                .and_then(|value| Preset::from_value(&value))
                .map(|preset| {
                    for warning in &preset.header_warnings {
                        self.warn(format!("{file}: {warning}"));
                    }
                    self.resolve_preset(&file, &preset)
                });
            let outcome = PresetOutcome { file, result };
            tracing::debug!(preset = %outcome.file, bound = outcome.is_bound(), "resolved preset");
            presets.push(outcome);
        }

        let report = BindingReport {
            presets,
            warnings: self.warnings.into_iter().collect(),
            unavailable: None,
        };
        tracing::info!(
            presets = report.presets.len(),
            bound = report.presets.iter().filter(|p| p.is_bound()).count(),
            warnings = report.warnings.len(),
            "binding resolution complete"
        );
        report
    }

    /// Resolve each kind of one parsed preset.
    pub fn resolve_preset(&mut self, file: &str, preset: &Preset) -> Vec<(ReferenceKind, RefOutcome)> {
        ReferenceKind::ALL
            .iter()
            .filter_map(|&kind| {
                let resolvable = kind.library_dir(&self.layout).is_some();
                let outcome = match (resolvable, preset.binding.get(kind)) {
                    (false, None) => return None,
                    (false, Some(_)) => RefOutcome::Skipped,
                    (true, None) => RefOutcome::Unresolved(UnresolvedReason::Absent),
                    (true, Some(RefSlot::Incomplete { id, version })) => {
                        RefOutcome::Unresolved(UnresolvedReason::Incomplete {
                            id: id.clone(),
                            version: version.clone(),
                        })
                    }
                    (true, Some(RefSlot::Complete(reference))) => self.find(file, reference),
                    (true, Some(RefSlot::Declared)) => {
                        RefOutcome::Unresolved(UnresolvedReason::Incomplete {
                            id: None,
                            version: None,
                        })
                    }
                };
                Some((kind, outcome))
            })
            .collect()
    }

    fn find(&mut self, file: &str, reference: &Reference) -> RefOutcome {
        let kind = reference.kind;
        let Some(dir) = kind.library_dir(&self.layout).map(Path::to_path_buf) else {
            return RefOutcome::Skipped;
        };
        if !self.libraries.contains_key(&kind) {
            let library = self.load_library(&dir);
            self.libraries.insert(kind, library);
        }
        let found: Vec<PathBuf> = match self.libraries.get(&kind) {
            Some(Ok(docs)) => docs
                .iter()
                .filter(|doc| doc.matches(kind, reference))
                .map(|doc| doc.rel.clone())
                .collect(),
            Some(Err(reason)) => return RefOutcome::Unresolved(reason.clone()),
            None => return RefOutcome::Skipped,
        };

        let mut found = found.into_iter();
        let Some(first) = found.next() else {
            return RefOutcome::Unresolved(UnresolvedReason::NoMatch {
                id: reference.id.clone(),
                version: reference.version.clone(),
                dir,
            });
        };
        let others: Vec<String> = found.map(|p| p.display().to_string()).collect();
        if !others.is_empty() {
            self.warn(format!(
                "{file}: {reference} also matches {} (using {})",
                others.join(", "),
                first.display()
            ));
        }
        RefOutcome::Resolved(first)
    }

    fn load_library(&mut self, dir: &Path) -> Library {
        let files = match yaml_files(&self.root.join(dir)) {
            Ok(Some(files)) => files,
            Ok(None) => {
                return Err(UnresolvedReason::LibraryMissing {
                    dir: dir.to_path_buf(),
                })
            }
            Err(e) => {
                return Err(UnresolvedReason::LibraryUnreadable {
                    dir: dir.to_path_buf(),
                    reason: e.to_string(),
                })
            }
        };
        let mut docs = Vec::with_capacity(files.len());
        for (name, path) in files {
            let rel = dir.join(&name);
            match load_yaml(&path) {
                Ok(Value::Object(fields)) => docs.push(LibraryDoc { rel, fields }),
                Ok(_) => {
                    self.warn(format!("{}: skipped, not a mapping", rel.display()));
                }
                Err(e) => self.warn(format!("{}: skipped, {}", rel.display(), e.reason())),
            }
        }
        tracing::debug!(library = %dir.display(), documents = docs.len(), "loaded library");
        Ok(docs)
    }

    fn warn(&mut self, warning: String) {
        tracing::warn!("{warning}");
        self.warnings.insert(warning);
    }
}

/// Top-level `*.yaml` / `*.yml` files in `dir`, sorted by file name.
/// `Ok(None)` if `dir` is not a directory.
fn yaml_files(dir: &Path) -> std::io::Result<Option<Vec<(String, PathBuf)>>> {
    if !dir.is_dir() {
        return Ok(None);
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if name.ends_with(".yaml") || name.ends_with(".yml") {
            files.push((name, entry.path()));
        }
    }
    files.sort();
    Ok(Some(files))
}
