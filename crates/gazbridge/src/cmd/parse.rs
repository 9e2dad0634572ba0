use std::io::Read;

use bytes::BytesMut;
use gazbridge_frame::{classify, parse_time_with_matcher, LineScanner, Segment, Token};
use tokio_util::codec::Decoder;

use crate::cmd::ParseArgs;
use crate::exit::{frame_error, io_error, CliResult, SUCCESS};
use crate::output::{print_tokens, OutputFormat, TokenReport};

pub fn run(args: ParseArgs, format: OutputFormat) -> CliResult<i32> {
    let segments = if args.lines.is_empty() {
        let mut input = Vec::new();
        std::io::stdin()
            .read_to_end(&mut input)
            .map_err(|err| io_error("failed reading stdin", err))?;
        scan(&input, args.scan_threshold)?
    } else {
        args.lines
            .iter()
            .map(|line| Segment::Line(line.clone()))
            .collect()
    };

    let reports: Vec<TokenReport> = segments.iter().flat_map(report).collect();
    print_tokens(&reports, format);
    Ok(SUCCESS)
}

/// Split raw bytes the way the bridge reader does.
fn scan(input: &[u8], threshold: usize) -> CliResult<Vec<Segment>> {
    let mut scanner = LineScanner::new(threshold);
    let mut buf = BytesMut::from(input);
    let mut segments = Vec::new();
    while let Some(segment) = scanner
        .decode(&mut buf)
        .map_err(|err| frame_error("scan failed", err))?
    {
        segments.push(segment);
    }
    while let Some(segment) = scanner
        .decode_eof(&mut buf)
        .map_err(|err| frame_error("scan failed", err))?
    {
        segments.push(segment);
    }
    Ok(segments)
}

fn report(segment: &Segment) -> Vec<TokenReport> {
    let text = segment.text();
    let kind = if segment.is_chunk() { "chunk" } else { "line" };
    classify(segment)
        .into_iter()
        .map(|token| {
            let matcher = match token {
                Token::Stop(_) => parse_time_with_matcher(text).map(|(_, name)| name),
                _ => None,
            };
            let note = match token {
                Token::Ignored(reason) => Some(reason.to_string()),
                _ => None,
            };
            TokenReport {
                input: text.to_string(),
                segment: kind,
                kind: token.kind(),
                seconds: token.time().map(|t| t.seconds),
                centis: token.time().map(|t| t.centis),
                matcher,
                note,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stdin_bytes_split_like_the_reader() {
        let segments = scan(b"C0\r\n\r\nc1 00004.4800\r", 128).unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::Line("C0".into()),
                Segment::Line("c1 00004.4800".into())
            ]
        );
    }

    #[test]
    fn trailing_bytes_become_a_chunk() {
        let segments = scan(b"C0\nC0 c1 7.5", 128).unwrap();
        assert_eq!(segments.last(), Some(&Segment::Chunk("C0 c1 7.5".into())));

        let reports = report(&segments[1]);
        let kinds: Vec<_> = reports.iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec!["start", "stop"]);
        assert_eq!(reports[1].seconds, Some(7));
        assert_eq!(reports[1].centis, Some(50));
        assert_eq!(reports[1].matcher, Some("short-fraction"));
    }

    #[test]
    fn ignored_tokens_carry_a_note() {
        let reports = report(&Segment::Line("C1 00012.3400".into()));
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].kind, "ignored");
        assert_eq!(
            reports[0].note.as_deref(),
            Some("upper-case C1 ignored by rule")
        );
    }
}
