use std::collections::BTreeMap;

use crate::entry::SchemaEntry;

/// Group that collects entries whose prefix is shared with no other entry.
pub const OTHER_GROUP: &str = "_other";

/// Entries sharing a name prefix, for display.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingGroup<'a> {
    pub name: String,
    pub entries: Vec<&'a SchemaEntry>,
}

impl SettingGroup<'_> {
    /// Display title: `gps` stays `gps`, `_other` becomes `other`.
    pub fn title(&self) -> String {
        self.name.trim_matches('_').replace('_', " ")
    }
}

/// Group entries by the text before their first `_`.
///
/// A prefix with a single member goes to [`OTHER_GROUP`], as do names
/// without an underscore. Groups are ordered by name with `_other` last;
/// entries inside a group are ordered by name.
pub fn group_by_prefix<'a>(entries: impl IntoIterator<Item = &'a SchemaEntry>) -> Vec<SettingGroup<'a>> {
    let mut by_prefix: BTreeMap<&str, Vec<&'a SchemaEntry>> = BTreeMap::new();
    let mut other: Vec<&'a SchemaEntry> = Vec::new();

    for entry in entries {
        match entry.name.split_once('_') {
            Some((prefix, _)) if !prefix.is_empty() => {
                by_prefix.entry(prefix).or_default().push(entry);
            }
            _ => other.push(entry),
        }
    }

    let mut groups = Vec::new();
    for (prefix, mut members) in by_prefix {
        if members.len() == 1 {
            other.append(&mut members);
            continue;
        }
        members.sort_by(|a, b| a.name.cmp(&b.name));
        groups.push(SettingGroup {
            name: prefix.to_string(),
            entries: members,
        });
    }

    if !other.is_empty() {
        other.sort_by(|a, b| a.name.cmp(&b.name));
        groups.push(SettingGroup {
            name: OTHER_GROUP.to_string(),
            entries: other,
        });
    }

    groups
}
