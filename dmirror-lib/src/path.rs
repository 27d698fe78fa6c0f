use crate::validation::check_control_leading_trailing;

pub const MAX_BASENAME_CHARS: usize = 512;
pub const MAX_SEGMENTS: usize = 32;

pub const JSON_EXT: &str = ".json";

fn valid_pathname_char(ch: &char) -> bool {
    (match ch {
        '/' | '\\' => false,
        _ => true
    }) && !ch.is_control()
}

pub fn basename_valid(given: &str) -> bool {
    !given.is_empty() &&
        given != "." &&
        given != ".." &&
        given.chars().all(|ch| valid_pathname_char(&ch)) &&
        check_control_leading_trailing(given, Some(MAX_BASENAME_CHARS))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetPath {
    folders: Vec<String>,
    name: String,
}

impl TargetPath {
    /// splits the given path on `/`, ignoring empty segments, and appends
    /// `.json` to the final segment if it is missing
    pub fn parse(given: &str) -> Option<Self> {
        let mut segments: Vec<String> = Vec::new();

        for part in given.split('/') {
            let trimmed = part.trim();

            if trimmed.is_empty() {
                continue;
            }

            if !basename_valid(trimmed) {
                return None;
            }

            segments.push(trimmed.to_owned());
        }

        if segments.len() > MAX_SEGMENTS {
            return None;
        }

        let last = segments.pop()?;
        let name = if last.to_ascii_lowercase().ends_with(JSON_EXT) {
            last
        } else {
            format!("{last}{JSON_EXT}")
        };

        Some(TargetPath {
            folders: segments,
            name,
        })
    }

    pub fn folders(&self) -> &[String] {
        &self.folders
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn joined(&self) -> String {
        join(self.folders.iter().map(String::as_str).chain([self.name.as_str()]))
    }
}

pub fn join<'a, I>(segments: I) -> String
where
    I: IntoIterator<Item = &'a str>
{
    let mut rtn = String::new();

    for segment in segments {
        if !rtn.is_empty() {
            rtn.push('/');
        }

        rtn.push_str(segment);
    }

    rtn
}

pub fn child(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_owned()
    } else {
        format!("{parent}/{name}")
    }
}
