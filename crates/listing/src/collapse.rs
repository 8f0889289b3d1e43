use dirview_protocol::to_absolute;
use std::fs;
use std::path::Path;

/// Display name for directory `name` inside `base`.
///
/// While the current directory holds exactly one entry and that entry is a
/// directory, its name is appended (`a` → `a/b` → `a/b/c`), for at most
/// `max_depth` hops. Any read error, a branch, an empty directory or a file
/// leaf stops the walk and the name built so far is returned.
#[must_use]
pub fn collapse(base: &Path, name: &str, max_depth: usize) -> String {
    let mut display = name.to_string();

    for _ in 0..max_depth {
        let current = to_absolute(base, &display);
        let Some(child) = sole_child_dir(&current) else {
            break;
        };
        display.push('/');
        display.push_str(&child);
    }

    display
}

fn sole_child_dir(dir: &Path) -> Option<String> {
    let mut children = match fs::read_dir(dir) {
        Ok(children) => children,
        Err(err) => {
            log::debug!("Collapse stopped at {}: {err}", dir.display());
            return None;
        }
    };

    let only = children.next()?.ok()?;
    if children.next().is_some() {
        return None;
    }

    only.file_type()
        .ok()
        .filter(fs::FileType::is_dir)
        .map(|_| only.file_name().to_string_lossy().into_owned())
}
