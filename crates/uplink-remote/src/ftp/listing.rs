//! Directory listing parsers.
//!
//! Only plain files and directories are reported. Symbolic links, devices
//! and the `.`/`..` pseudo-entries are skipped, so the sync never tries to
//! delete or descend into them.

use crate::types::{EntryKind, RemoteEntry};

/// Parse one line of an `MLSD` response (RFC 3659), e.g.
/// `type=file;size=1830;modify=20240101120000; index.html`.
pub fn parse_mlsd_line(line: &str) -> Option<RemoteEntry> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (facts, name) = line.split_once(' ')?;
    if name.is_empty() {
        return None;
    }
    let kind = facts
        .split(';')
        .filter_map(|fact| fact.split_once('='))
        .find(|(key, _)| key.eq_ignore_ascii_case("type"))
        .map(|(_, value)| value.to_ascii_lowercase())?;
    let kind = match kind.as_str() {
        "file" => EntryKind::File,
        "dir" => EntryKind::Directory,
        _ => return None,
    };
    Some(RemoteEntry {
        name: name.to_string(),
        kind,
    })
}

/// Parse one line of a Unix-style `LIST` response, e.g.
/// `-rw-r--r--   1 web  web   1830 Jan  1 12:00 index.html`.
///
/// The name is everything after the eighth field, spaces included.
pub fn parse_list_line(line: &str) -> Option<RemoteEntry> {
    let line = line.trim_end_matches(['\r', '\n']);
    let kind = match line.chars().next()? {
        '-' => EntryKind::File,
        'd' => EntryKind::Directory,
        _ => return None,
    };
    let mut rest = line;
    for _ in 0..8 {
        rest = rest.trim_start();
        let end = rest.find(char::is_whitespace)?;
        rest = &rest[end..];
    }
    let name = rest.trim_start();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(RemoteEntry {
        name: name.to_string(),
        kind,
    })
}

/// Parse a whole listing body with the given line parser.
pub fn parse_listing(body: &str, parse: fn(&str) -> Option<RemoteEntry>) -> Vec<RemoteEntry> {
    body.lines().filter_map(parse).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mlsd_file_and_dir() {
        assert_eq!(
            parse_mlsd_line("type=file;size=12;modify=20240101120000; a.txt"),
            Some(RemoteEntry::file("a.txt"))
        );
        assert_eq!(
            parse_mlsd_line("Type=dir;Modify=20240101120000; assets\r"),
            Some(RemoteEntry::dir("assets"))
        );
    }

    #[test]
    fn mlsd_skips_pseudo_and_links() {
        assert_eq!(parse_mlsd_line("type=cdir; ."), None);
        assert_eq!(parse_mlsd_line("type=pdir; .."), None);
        assert_eq!(parse_mlsd_line("type=OS.unix=slink:/x; link"), None);
    }

    #[test]
    fn mlsd_keeps_spaces_in_names() {
        assert_eq!(
            parse_mlsd_line("type=file; my file.txt"),
            Some(RemoteEntry::file("my file.txt"))
        );
    }

    #[test]
    fn list_unix_lines() {
        assert_eq!(
            parse_list_line("-rw-r--r--   1 web  web   1830 Jan  1 12:00 index.html"),
            Some(RemoteEntry::file("index.html"))
        );
        assert_eq!(
            parse_list_line("drwxr-xr-x   2 web  web   4096 Mar 10  2023 css"),
            Some(RemoteEntry::dir("css"))
        );
        assert_eq!(
            parse_list_line("-rw-r--r-- 1 web web 10 Jan 1 12:00 two  spaces.txt"),
            Some(RemoteEntry::file("two  spaces.txt"))
        );
    }

    #[test]
    fn list_skips_noise() {
        assert_eq!(parse_list_line("total 12"), None);
        assert_eq!(parse_list_line("lrwxrwxrwx 1 a a 4 Jan 1 12:00 l -> x"), None);
        assert_eq!(parse_list_line("drwxr-xr-x 2 a a 4096 Jan 1 12:00 ."), None);
        assert_eq!(parse_list_line(""), None);
    }

    #[test]
    fn whole_listing() {
        let body = "type=dir; sub\r\ntype=file; a.txt\r\ntype=cdir; .\r\n";
        let entries = parse_listing(body, parse_mlsd_line);
        assert_eq!(entries, vec![RemoteEntry::dir("sub"), RemoteEntry::file("a.txt")]);
    }
}
