use inkpad_diff::{DiffSegment, DiffSegmentKind, DiffTokenKind, Review, diff_words};

fn main() {
    let original = "The colour of the sky was blue and calm";
    let suggested = "The color of the evening sky was deep blue";

    let tokens = diff_words(original, suggested);
    let rendered: Vec<String> = tokens
        .iter()
        .map(|token| match token.kind {
            DiffTokenKind::Unchanged => token.text.clone(),
            DiffTokenKind::Added => format!("{{+{}+}}", token.text),
            DiffTokenKind::Removed => format!("[-{}-]", token.text),
        })
        .collect();
    println!("{}", rendered.join(" "));

    let mut review = Review::new(original, suggested);
    for hunk in review.hunks() {
        print!(
            "hunk {}: -{:?} +{:?}",
            hunk.index, hunk.removed, hunk.added
        );
        if let Some(intraline) = &hunk.intraline {
            print!(
                "  {} => {}",
                render_segments(&intraline.old_segments),
                render_segments(&intraline.new_segments)
            );
        }
        println!();
    }

    review.reject(0);
    println!("resolved: {}", review.resolved_text());
}

fn render_segments(segments: &[DiffSegment]) -> String {
    let mut out = String::new();
    for seg in segments {
        match seg.kind {
            DiffSegmentKind::Unchanged => out.push_str(&seg.text),
            DiffSegmentKind::Added => {
                out.push_str("{+");
                out.push_str(&seg.text);
                out.push_str("+}");
            }
            DiffSegmentKind::Removed => {
                out.push_str("[-");
                out.push_str(&seg.text);
                out.push_str("-]");
            }
        }
    }
    out
}
