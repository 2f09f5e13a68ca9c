//! The static profile knowledge base.
//!
//! A fixed table of question/answer entries, read-only at runtime. Answers
//! share their text with the assistant's canned replies.

use serde::Serialize;

use crate::matcher::Topic;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KnowledgeEntry {
  pub category: &'static str,
  pub question: &'static str,
  pub answer:   &'static str,
  pub keywords: &'static [&'static str],
}

const fn faq(
  question: &'static str,
  topic: Topic,
  keywords: &'static [&'static str],
) -> KnowledgeEntry {
  KnowledgeEntry {
    category: "faq",
    question,
    answer: topic.reply_text(),
    keywords,
  }
}

static ENTRIES: &[KnowledgeEntry] = &[
  faq(
    "Who is Ahmad Ziyad?",
    Topic::Identity,
    &["ahmad ziyad", "who is", "background", "profile", "experience", "about"],
  ),
  faq(
    "What is Ahmad Ziyad's current role?",
    Topic::CurrentRole,
    &[
      "current role",
      "company",
      "royal cyber",
      "essent guaranty",
      "position",
      "job",
      "ai engineer",
    ],
  ),
  faq(
    "What are Ahmad Ziyad's technical skills?",
    Topic::Skills,
    &[
      "skills",
      "technologies",
      "tech stack",
      "expert",
      "ai",
      "ml",
      "aws",
      "python",
      "react",
    ],
  ),
  faq(
    "What projects has Ahmad Ziyad worked on?",
    Topic::Projects,
    &[
      "projects",
      "portfolio",
      "healthcare",
      "pet adoptions",
      "nasa",
      "property",
      "github",
      "demo",
    ],
  ),
  faq(
    "Tell me about Ahmad Ziyad's professional experience",
    Topic::Experience,
    &[
      "experience",
      "work history",
      "career",
      "royal cyber",
      "arab bank",
      "hcl",
      "cognizant",
    ],
  ),
  faq(
    "What certifications does Ahmad Ziyad hold?",
    Topic::Certifications,
    &[
      "certifications",
      "certs",
      "aws",
      "pmp",
      "pmi",
      "oci",
      "oracle",
      "nvidia",
      "professional",
    ],
  ),
  faq(
    "What is Ahmad Ziyad's educational background?",
    Topic::Education,
    &[
      "education",
      "degree",
      "university",
      "buffalo",
      "master",
      "bachelor",
      "college",
      "srms",
    ],
  ),
  faq(
    "How can I contact Ahmad Ziyad?",
    Topic::Contact,
    &[
      "contact", "email", "linkedin", "github", "location", "reach", "social",
      "demo",
    ],
  ),
];

/// Every entry, in table order.
pub fn entries() -> &'static [KnowledgeEntry] { ENTRIES }

/// Entries in `category` (if given) with at least one keyword contained in
/// `query` (if non-blank), in table order.
pub fn search(query: Option<&str>, category: Option<&str>) -> Vec<&'static KnowledgeEntry> {
  let query = query
    .map(str::trim)
    .filter(|q| !q.is_empty())
    .map(str::to_lowercase);

  ENTRIES
    .iter()
    .filter(|e| category.is_none_or(|c| e.category.eq_ignore_ascii_case(c)))
    .filter(|e| {
      query
        .as_deref()
        .is_none_or(|q| e.keywords.iter().any(|k| q.contains(k)))
    })
    .collect()
}
