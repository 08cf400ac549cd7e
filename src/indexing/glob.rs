//! Two bespoke matchers, intentionally distinct (§4.2, §8):
//!
//! - [`glob_match`]: path globs with `/`-aware `*`/`**`/`?` semantics, used
//!   to expand `index(patterns)` into a file list.
//! - [`name_glob`]: character-level `*`/`?` matching with no separator
//!   semantics, used by the Query Engine to match symbol names.
//!
//! Both are hand-rolled rather than pulled from the `glob`/`ignore`
//! crates: patterns here are user-facing strings evaluated against
//! in-memory paths and symbol names, not filesystem walks.

/// Match `path` against path-glob `pattern`. `?` matches one non-`/`
/// character; `*` matches zero or more non-`/` characters; `**` matches
/// zero or more path segments, including `/`, and consumes a trailing `/`
/// after it.
pub fn glob_match(pattern: &str, path: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let path: Vec<char> = path.chars().collect();
    match_from(&pattern, 0, &path, 0)
}

fn match_from(pat: &[char], mut pi: usize, path: &[char], mut si: usize) -> bool {
    let mut star_pi: Option<usize> = None;
    let mut star_si = 0usize;
    let mut star_is_double = false;

    loop {
        if pi < pat.len() {
            match pat[pi] {
                '*' if pi + 1 < pat.len() && pat[pi + 1] == '*' => {
                    let mut next = pi + 2;
                    if next < pat.len() && pat[next] == '/' {
                        next += 1;
                    }
                    star_pi = Some(next);
                    star_si = si;
                    star_is_double = true;
                    pi = next;
                    continue;
                }
                '*' => {
                    star_pi = Some(pi + 1);
                    star_si = si;
                    star_is_double = false;
                    pi += 1;
                    continue;
                }
                '?' if si < path.len() && path[si] != '/' => {
                    pi += 1;
                    si += 1;
                    continue;
                }
                c if si < path.len() && path[si] == c => {
                    pi += 1;
                    si += 1;
                    continue;
                }
                _ => {}
            }
        } else if si == path.len() {
            return true;
        }

        // Mismatch or pattern exhausted with path remaining: backtrack to
        // the last `*`/`**`, advancing the path cursor by one character.
        match star_pi {
            Some(spi) => {
                if star_is_double {
                    if star_si >= path.len() {
                        return false;
                    }
                    star_si += 1;
                    si = star_si;
                    pi = spi;
                } else {
                    if star_si >= path.len() || path[star_si] == '/' {
                        return false;
                    }
                    star_si += 1;
                    si = star_si;
                    pi = spi;
                }
            }
            None => return false,
        }
    }
}

/// The literal directory portion up to the last `/` before the first
/// wildcard character, used to bound the walk's recursion root.
pub fn glob_prefix(pattern: &str) -> &str {
    let wildcard_pos = pattern.find(['*', '?']);
    let search_end = wildcard_pos.unwrap_or(pattern.len());
    match pattern[..search_end].rfind('/') {
        Some(slash) => &pattern[..slash],
        None => ".",
    }
}

/// Character-level glob used for symbol-name matching: no path-separator
/// semantics, `*` may cross what would be a `/` in a path-glob.
pub fn name_glob(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.to_lowercase().chars().collect();
    let name: Vec<char> = name.to_lowercase().chars().collect();
    name_match_from(&pattern, 0, &name, 0)
}

fn name_match_from(pat: &[char], mut pi: usize, name: &[char], mut si: usize) -> bool {
    let mut star_pi: Option<usize> = None;
    let mut star_si = 0usize;

    loop {
        if pi < pat.len() {
            match pat[pi] {
                '*' => {
                    star_pi = Some(pi + 1);
                    star_si = si;
                    pi += 1;
                    continue;
                }
                '?' if si < name.len() => {
                    pi += 1;
                    si += 1;
                    continue;
                }
                c if si < name.len() && name[si] == c => {
                    pi += 1;
                    si += 1;
                    continue;
                }
                _ => {}
            }
        } else if si == name.len() {
            return true;
        }

        match star_pi {
            Some(spi) => {
                if star_si >= name.len() {
                    return false;
                }
                star_si += 1;
                si = star_si;
                pi = spi;
            }
            None => return false,
        }
    }
}

pub fn has_glob_metachar(pattern: &str) -> bool {
    pattern.contains(['*', '?'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_matches_within_one_segment() {
        assert!(glob_match("src/*.rs", "src/lib.rs"));
        assert!(!glob_match("src/*.rs", "src/sub/lib.rs"));
    }

    #[test]
    fn double_star_crosses_segments() {
        assert!(glob_match("src/**/*.rs", "src/a/b/lib.rs"));
        assert!(glob_match("src/**/*.rs", "src/lib.rs"));
        assert!(glob_match("**/mod.rs", "a/b/c/mod.rs"));
    }

    #[test]
    fn question_mark_matches_one_non_slash_char() {
        assert!(glob_match("src/?.rs", "src/a.rs"));
        assert!(!glob_match("src/?.rs", "src/ab.rs"));
        assert!(!glob_match("src/?.rs", "src//.rs"));
    }

    #[test]
    fn glob_prefix_extracts_literal_directory() {
        assert_eq!(glob_prefix("src/**/*.rs"), "src");
        assert_eq!(glob_prefix("*.rs"), ".");
        assert_eq!(glob_prefix("a/b/c.rs"), "a/b");
    }

    #[test]
    fn name_glob_has_no_separator_semantics() {
        assert!(name_glob("*init*", "src/init"));
        assert!(!glob_match("*init*", "src/init"));
    }

    #[test]
    fn name_glob_is_case_insensitive() {
        assert!(name_glob("*BRAIN*", "initBrain"));
    }
}
