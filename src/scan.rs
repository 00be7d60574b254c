//! Forward scan for the `]` that closes a loop.

/// Find the index of the `]` matching a `[` whose body starts at `loop_start`.
///
/// The scan keeps a nesting counter that starts at 1, goes up on every `[`
/// and down on every `]`; the index where it hits 0 is returned. Nothing is
/// cached, so callers rescan every time a `[` is dispatched.
///
/// Returns `None` when the program ends before the loop is closed.
pub fn find_loop_end(program: &[u8], loop_start: usize) -> Option<usize> {
    let mut depth: usize = 1;

    for (offset, &byte) in program.get(loop_start..)?.iter().enumerate() {
        match byte {
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(loop_start + offset);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_adjacent_close() {
        assert_eq!(find_loop_end(b"[]", 1), Some(1));
    }

    #[test]
    fn skips_nested_pairs() {
        //            0123456789
        let code = b"+[>[-]<[]]+";
        assert_eq!(find_loop_end(code, 2), Some(9));
        assert_eq!(find_loop_end(code, 4), Some(5));
        assert_eq!(find_loop_end(code, 8), Some(8));
    }

    #[test]
    fn ignores_comment_bytes() {
        assert_eq!(find_loop_end(b"[ loop body ] tail", 1), Some(12));
    }

    #[test]
    fn unterminated_loop_is_none() {
        assert_eq!(find_loop_end(b"[[]", 1), None);
        assert_eq!(find_loop_end(b"[", 1), None);
    }

    #[test]
    fn start_past_end_is_none() {
        assert_eq!(find_loop_end(b"[", 5), None);
    }
}
