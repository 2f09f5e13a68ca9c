//! Canned-response matcher for the profile assistant.
//!
//! A query is lower-cased and tested against [`RULES`] in order. The first
//! rule whose predicate holds supplies the reply; if none holds, the
//! [`Topic::General`] reply is returned. Matching is plain substring
//! containment: no ranking, no fuzzy matching.
//!
//! The first rule is an off-topic gate: a query that mentions nothing about
//! the profile and asks no who/what/tell/about question goes straight to
//! the general reply, so short keywords like `ai` cannot fire on words such
//! as "explain".

use serde::{Deserialize, Serialize};

/// The subject a reply covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
  Identity,
  Skills,
  Projects,
  Experience,
  CurrentRole,
  Education,
  Certifications,
  Contact,
  AiExpertise,
  General,
}

impl Topic {
  /// The fixed text returned for this topic.
  pub const fn reply_text(self) -> &'static str {
    match self {
      Topic::Identity => include_str!("replies/identity.md"),
      Topic::Skills => include_str!("replies/skills.md"),
      Topic::Projects => include_str!("replies/projects.md"),
      Topic::Experience => include_str!("replies/experience.md"),
      Topic::CurrentRole => include_str!("replies/current_role.md"),
      Topic::Education => include_str!("replies/education.md"),
      Topic::Certifications => include_str!("replies/certifications.md"),
      Topic::Contact => include_str!("replies/contact.md"),
      Topic::AiExpertise => include_str!("replies/ai.md"),
      Topic::General => include_str!("replies/general.md"),
    }
  }
}

/// A test over the lower-cased query.
#[derive(Debug, Clone, Copy)]
pub enum Predicate {
  /// At least one keyword is present.
  Any(&'static [&'static str]),
  /// At least one keyword from each list is present.
  Both(&'static [&'static str], &'static [&'static str]),
  /// No keyword is present.
  NoneOf(&'static [&'static str]),
}

impl Predicate {
  pub fn holds(&self, query: &str) -> bool {
    let any = |words: &[&str]| words.iter().any(|w| query.contains(w));
    match self {
      Predicate::Any(words) => any(words),
      Predicate::Both(a, b) => any(a) && any(b),
      Predicate::NoneOf(words) => !any(words),
    }
  }
}

#[derive(Debug, Clone, Copy)]
pub struct Rule {
  pub predicate: Predicate,
  pub topic:     Topic,
}

/// Words that mark a query as being about the profile.
pub const ON_TOPIC: &[&str] = &[
  "ahmad",
  "ziyad",
  "profile",
  "experience",
  "skills",
  "projects",
  "work",
  "career",
  "background",
  "contact",
  "education",
  "certification",
  "current",
  "role",
  "company",
  "who",
  "what",
  "tell",
  "about",
];

/// Evaluated top to bottom; first match wins.
pub const RULES: &[Rule] = &[
  Rule {
    predicate: Predicate::NoneOf(ON_TOPIC),
    topic:     Topic::General,
  },
  Rule {
    predicate: Predicate::Both(&["who"], &["ahmad", "ziyad"]),
    topic:     Topic::Identity,
  },
  Rule {
    predicate: Predicate::Any(&["skill", "technical", "technology", "tech"]),
    topic:     Topic::Skills,
  },
  Rule {
    predicate: Predicate::Any(&["project", "portfolio", "work", "built"]),
    topic:     Topic::Projects,
  },
  Rule {
    predicate: Predicate::Any(&[
      "experience",
      "career",
      "work history",
      "background",
    ]),
    topic:     Topic::Experience,
  },
  Rule {
    predicate: Predicate::Any(&["current", "job", "role", "company"]),
    topic:     Topic::CurrentRole,
  },
  Rule {
    predicate: Predicate::Any(&["education", "degree", "university", "college"]),
    topic:     Topic::Education,
  },
  Rule {
    predicate: Predicate::Any(&["certification", "certified", "cert"]),
    topic:     Topic::Certifications,
  },
  Rule {
    predicate: Predicate::Any(&["contact", "reach", "email", "phone"]),
    topic:     Topic::Contact,
  },
  Rule {
    predicate: Predicate::Any(&[
      "ai",
      "ml",
      "machine learning",
      "artificial intelligence",
      "rag",
    ]),
    topic:     Topic::AiExpertise,
  },
];

/// A matched reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CannedReply {
  pub topic: Topic,
  pub text:  &'static str,
}

/// The topic of the first rule matching `query`, or [`Topic::General`].
pub fn classify(query: &str) -> Topic {
  let query = query.to_lowercase();
  RULES
    .iter()
    .find(|rule| rule.predicate.holds(&query))
    .map_or(Topic::General, |rule| rule.topic)
}

/// The canned reply for `query`.
pub fn reply(query: &str) -> CannedReply {
  let topic = classify(query);
  CannedReply {
    topic,
    text: topic.reply_text(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn skills_query_returns_skills_block() {
    let r = reply("What SKILLS does he have?");
    assert_eq!(r.topic, Topic::Skills);
    assert_eq!(r.text, Topic::Skills.reply_text());
    assert!(r.text.contains("TensorFlow, PyTorch, Keras, Hugging Face"));
  }

  #[test]
  fn unrecognised_query_returns_general_block_verbatim() {
    let r = reply("hello there");
    assert_eq!(r.topic, Topic::General);
    assert_eq!(r.text, include_str!("replies/general.md"));
  }

  #[test]
  fn empty_query_is_general() {
    assert_eq!(classify(""), Topic::General);
  }

  #[test]
  fn identity_needs_both_who_and_name() {
    assert_eq!(classify("Who is Ahmad Ziyad?"), Topic::Identity);
    // "who" alone falls through the ladder.
    assert_eq!(classify("who are you"), Topic::General);
  }

  #[test]
  fn earlier_rules_win() {
    // Mentions both projects and contact; projects come first.
    assert_eq!(classify("how do I contact him about a project"), Topic::Projects);
    // "tech" is checked before "experience".
    assert_eq!(classify("tech experience"), Topic::Skills);
  }

  #[test]
  fn each_topic_is_reachable() {
    let cases = [
      ("what university did he attend", Topic::Education),
      ("list his certifications", Topic::Certifications),
      ("what is his email", Topic::Contact),
      ("tell me about his career", Topic::Experience),
      ("which company is he at", Topic::CurrentRole),
      ("what about machine learning", Topic::AiExpertise),
      ("tell me about the portfolio", Topic::Projects),
    ];
    for (query, topic) in cases {
      assert_eq!(classify(query), topic, "query: {query:?}");
    }
  }

  #[test]
  fn off_topic_queries_skip_the_ladder() {
    // "ai" and "ml" would otherwise match inside these words.
    for query in ["can you explain this", "wait, hello", "do you like html"] {
      assert_eq!(classify(query), Topic::General, "query: {query:?}");
      assert_eq!(reply(query).text, Topic::General.reply_text());
    }
  }

  #[test]
  fn question_words_open_the_gate() {
    assert_eq!(classify("what about rag?"), Topic::AiExpertise);
    assert_eq!(classify("RAG pipelines"), Topic::General);
  }

  #[test]
  fn every_topic_has_text() {
    for rule in RULES {
      assert!(!rule.topic.reply_text().trim().is_empty());
    }
    assert!(!Topic::General.reply_text().trim().is_empty());
  }
}
