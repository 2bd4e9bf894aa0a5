mod common;

use chatpane::sse::SseDecoder;
use common::{content_line, sse_body, DONE_LINE};

fn decode_in_pieces(body: &[u8], cuts: &[usize]) -> (String, SseDecoder) {
    let mut decoder = SseDecoder::new();
    let mut text = String::new();
    let mut start = 0;
    for &cut in cuts.iter().chain(std::iter::once(&body.len())) {
        for fragment in decoder.feed(&body[start..cut]) {
            text.push_str(fragment.as_str());
        }
        start = cut;
    }
    for fragment in decoder.finish() {
        text.push_str(fragment.as_str());
    }
    (text, decoder)
}

/// Splitting the body anywhere, even inside a multi-byte character,
/// yields the same text as feeding it whole.
#[test]
fn test_every_split_point_gives_same_text() {
    let body = sse_body(&["Grüße, ", "世界", "!\n"], true);
    let bytes = body.as_bytes();
    let (whole, _) = decode_in_pieces(bytes, &[]);
    assert_eq!(whole, "Grüße, 世界!\n");

    for cut in 1..bytes.len() {
        let (text, decoder) = decode_in_pieces(bytes, &[cut]);
        assert_eq!(text, whole, "split at byte {cut}");
        assert!(decoder.is_done());
    }
}

#[test]
fn test_byte_at_a_time() {
    let body = sse_body(&["one ", "two"], false);
    let cuts: Vec<usize> = (1..body.len()).collect();
    let (text, decoder) = decode_in_pieces(body.as_bytes(), &cuts);
    assert_eq!(text, "one two");
    assert!(!decoder.is_done());
}

#[test]
fn test_sentinel_discards_everything_after_it() {
    let body = format!("{}{}{}", content_line("kept"), DONE_LINE, content_line("lost"));
    let mut decoder = SseDecoder::new();
    let fragments = decoder.feed(body.as_bytes());
    assert_eq!(fragments.len(), 1);
    assert_eq!(fragments[0].as_str(), "kept");
    assert!(decoder.is_done());
    assert_eq!(decoder.buffered(), 0);
    assert!(decoder.feed(content_line("later").as_bytes()).is_empty());
}

#[test]
fn test_malformed_lines_are_skipped() {
    let body = format!(
        "data: {{not json\n{}data: {{\"choices\":[]}}\n: keep-alive\nevent: ping\n{}",
        content_line("a"),
        content_line("b")
    );
    let mut decoder = SseDecoder::new();
    let text: String = decoder
        .feed(body.as_bytes())
        .iter()
        .map(|fragment| fragment.as_str())
        .collect();
    assert_eq!(text, "ab");
    assert_eq!(decoder.parse_errors(), 2);
}

#[test]
fn test_crlf_line_endings() {
    let body = content_line("win").replace('\n', "\r\n");
    let mut decoder = SseDecoder::new();
    let fragments = decoder.feed(body.as_bytes());
    assert_eq!(fragments[0].as_str(), "win");
}

#[test]
fn test_finish_flushes_unterminated_line_once() {
    let line = content_line("tail");
    let mut decoder = SseDecoder::new();
    assert!(decoder.feed(line.trim_end().as_bytes()).is_empty());
    assert_eq!(decoder.finish().len(), 1);
    assert!(decoder.finish().is_empty());
    assert_eq!(decoder.buffered(), 0);
}
