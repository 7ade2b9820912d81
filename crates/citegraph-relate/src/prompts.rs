//! Prompt text for relationship classification.

use citegraph_store::CitationTriplet;

pub const SYSTEM_PROMPT: &str =
    "You are an expert scientific literature analyst. You identify semantic relationships \
     between research papers from their titles and abstracts and answer only in JSON.";

/// Appended to the prompt before each retry after an invalid reply.
pub const RETRY_INSTRUCTION: &str = "\n\nIMPORTANT: Return valid JSON matching the exact schema.";

pub const EXTRACT_PROMPT: &str = r#"Identify the semantic relationships the citing paper (Paper 1) has with the cited paper (Paper 2).

**Paper 1 (citing):**
Title: {citing_title}
Abstract: {citing_abstract}

**Paper 2 (cited):**
Title: {cited_title}
Abstract: {cited_abstract}

**Relationship types** (zero, one or several may apply):

1. **Extends**: Paper 1 builds upon or improves the method, framework or approach of Paper 2.
2. **Solves**: Paper 1 addresses a problem or limitation identified or left open in Paper 2.
3. **Outperforms**: Paper 1 reports better results than the approach in Paper 2.
4. **Validates**: Paper 1 confirms or provides supporting evidence for the findings of Paper 2.
5. **Contradicts**: Paper 1 reports findings that conflict with those of Paper 2.
6. **Requires**: Paper 1 depends on concepts or methods from Paper 2 as a necessary foundation.
7. **Enables**: Paper 2 provides tools, datasets or methods that make Paper 1 possible.
8. **Adapts-from**: Paper 1 applies the approach of Paper 2 to a different domain or problem.
9. **Achieves**: Paper 1 realizes a goal or application suggested in Paper 2.
10. **Challenges**: Paper 1 questions the assumptions or methodology of Paper 2 without contradicting its results.

**Instructions:**
- Read both abstracts and consider them jointly.
- Report every relationship that is clearly supported by the text, and nothing else.
- For each relationship give short evidence from the abstracts and a one-sentence explanation.
- Use exactly the type names above.

Return a JSON object:

{
  "relationships": [
    {
      "type": "Extends",
      "confidence": "high|medium|low",
      "evidence": "text from the abstracts supporting the relationship",
      "explanation": "why the relationship holds"
    }
  ],
  "no_relationship_reason": "why no relationship applies, when the list is empty"
}
"#;

/// Fill the extraction prompt for one citation pair.
pub fn render_extract_prompt(triplet: &CitationTriplet) -> String {
    let or_na = |s: &str| if s.trim().is_empty() { "N/A".to_string() } else { s.to_string() };
    EXTRACT_PROMPT
        .replace("{citing_title}", &or_na(&triplet.citing_title))
        .replace("{citing_abstract}", &or_na(&triplet.citing_abstract))
        .replace("{cited_title}", &or_na(&triplet.cited_title))
        .replace("{cited_abstract}", &or_na(&triplet.cited_abstract))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_fills_every_placeholder() {
        let triplet = CitationTriplet {
            citing_id: "a".into(),
            citing_title: "Sparse Transformers".into(),
            citing_abstract: "We sparsify attention.".into(),
            cited_id: "b".into(),
            cited_title: String::new(),
            cited_abstract: "We propose attention.".into(),
        };
        let prompt = render_extract_prompt(&triplet);
        assert!(prompt.contains("Title: Sparse Transformers"));
        assert!(prompt.contains("Abstract: We propose attention."));
        assert!(prompt.contains("Title: N/A"));
        assert!(!prompt.contains("{cited_title}"));
    }
}
