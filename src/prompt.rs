use std::fmt::Write;

use serde::Serialize;

use crate::models::Digest;

pub const INSTRUCTIONS: [&str; 7] = [
    "Answer the question clearly and concisely.",
    "List specific student names when relevant.",
    "For \"not submitted\" questions, look for submission_status = 'Not Submitted'.",
    "For quiz scores, ignore entries with 'N/A' values.",
    "Calculate averages only from numeric quiz scores; 'N/A' is never zero.",
    "Use bullet points or numbered lists when listing multiple students or items.",
    "Be specific with numbers and percentages.",
];

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "[]".to_string())
}

/// Renders the question and digest as a single prompt. The question is
/// embedded verbatim and every digest list appears as pretty JSON.
pub fn build_prompt(question: &str, digest: &Digest) -> String {
    let mut output = String::new();

    let _ = writeln!(
        output,
        "You are a helpful AI assistant analyzing student data for a school administrator."
    );
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "Your task: Answer the following question based on the provided student data."
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "QUESTION: {question}");
    let _ = writeln!(output);
    let _ = writeln!(output, "DATA AVAILABLE:");
    let _ = writeln!(output, "- Total Students: {}", digest.student_count);
    let _ = writeln!(output, "- Students: {}", digest.roster.join(", "));
    let _ = writeln!(output);
    let _ = writeln!(output, "COLUMNS IN DATASET:");
    let _ = writeln!(output, "- {}", digest.field_names.join(", "));
    let _ = writeln!(output);
    let _ = writeln!(output, "HOMEWORK SUBMISSION DATA (sample):");
    let _ = writeln!(output, "{}", to_json(&digest.homework_aggregate));
    let _ = writeln!(output);
    let _ = writeln!(output, "QUIZ SCORE DATA (sample):");
    let _ = writeln!(output, "{}", to_json(&digest.quiz_samples));
    let _ = writeln!(output);
    let _ = writeln!(output, "FULL SAMPLE DATA:");
    let _ = writeln!(output, "{}", to_json(&digest.raw_sample));
    let _ = writeln!(output);
    let _ = writeln!(output, "INSTRUCTIONS:");
    for (index, instruction) in INSTRUCTIONS.iter().enumerate() {
        let _ = writeln!(output, "{}. {instruction}", index + 1);
    }
    let _ = writeln!(output);
    let _ = write!(output, "Provide a clear, helpful answer now:");

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::roster_store;
    use crate::scope::{AccessScope, ScopedView};
    use crate::summarize::{summarize, DigestLimits};

    #[test]
    fn prompt_embeds_question_and_digest() {
        let store = roster_store();
        let view = ScopedView::new(&store, AccessScope::new(Some(9), Some("A".to_string())));
        let digest = summarize(&view, &DigestLimits::default());
        let question = "Which students haven't submitted their homework yet?";
        let prompt = build_prompt(question, &digest);

        assert!(prompt.contains(&format!("QUESTION: {question}\n")));
        assert!(prompt.contains("- Total Students: 3"));
        assert!(prompt.contains("Sanya Joshi, Vihaan Desai, Aisha Khan"));
        assert!(prompt.contains("quiz_scheduled_date"));
        assert!(prompt.contains("\"submission_status\": \"Not Submitted\""));
        assert!(!prompt.contains("Aarav Kumar"));
        assert!(prompt.contains("7. Be specific with numbers and percentages."));
        assert!(prompt.ends_with("Provide a clear, helpful answer now:"));
    }

    #[test]
    fn quiz_section_never_lists_not_applicable_scores() {
        let store = roster_store();
        let view = ScopedView::new(&store, AccessScope::new(Some(10), None));
        let digest = summarize(&view, &DigestLimits::default());
        let prompt = build_prompt("average?", &digest);

        let quiz_section = prompt
            .split("QUIZ SCORE DATA (sample):")
            .nth(1)
            .and_then(|rest| rest.split("FULL SAMPLE DATA:").next())
            .unwrap();
        assert!(!quiz_section.contains("N/A"));
        assert!(quiz_section.contains("quiz_score"));
    }

    #[test]
    fn empty_digest_still_produces_a_prompt() {
        let digest = Digest {
            student_count: 0,
            roster: Vec::new(),
            homework_aggregate: Vec::new(),
            quiz_samples: Vec::new(),
            field_names: Vec::new(),
            raw_sample: Vec::new(),
        };
        let prompt = build_prompt("Who is missing work?", &digest);
        assert!(prompt.contains("- Total Students: 0"));
        assert!(prompt.contains("HOMEWORK SUBMISSION DATA (sample):\n[]"));
    }
}
