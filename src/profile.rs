//! Legacy field-based interview.
//!
//! The older interview walks a fixed field list instead of free
//! conversation. Its stopping and question-priority policy is a pure
//! function of the accumulated field map: keyword matching against small
//! vocabularies plus a years-of-experience regex, no external calls. It
//! survives as the `--legacy` path and as the fully deterministic fallback
//! style of interview.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info};

use crate::context::ProjectContext;
use crate::interview::read_answer;
use crate::llm::{GenerationError, TextGenerator, strip_code_fences};

/// Fields the interview always tries to fill first.
pub const ESSENTIAL_FIELDS: [&str; 3] = ["intended_use", "primary_languages", "experience_level"];

/// Fields worth having but negotiable for beginners and hobbyists.
pub const ADVANCED_FIELDS: [&str; 5] = [
    "coding_style",
    "testing_approach",
    "tooling_preferences",
    "workflow_process",
    "current_project",
];

const BEGINNER_WORDS: [&str; 10] = [
    "beginner",
    "junior",
    "student",
    "learning",
    "new",
    "starter",
    "novice",
    "self-taught",
    "hobby",
    "weekend",
];

const ADVANCED_WORDS: [&str; 10] = [
    "senior", "expert", "lead", "architect", "cto", "6", "7", "8", "9", "10",
];

const SIMPLE_USE_WORDS: [&str; 10] = [
    "homework",
    "assignment",
    "learning",
    "tutorial",
    "practice",
    "hobby",
    "personal",
    "weekend",
    "spare time",
    "family",
];

const BUSY_WORDS: [&str; 6] = [
    "hobby",
    "weekend",
    "spare time",
    "busy",
    "limited time",
    "family",
];

/// Maximum question counts: default, beginner-signal, simple-use-signal.
const MAX_QUESTIONS_DEFAULT: usize = 8;
const MAX_QUESTIONS_BEGINNER: usize = 5;
const MAX_QUESTIONS_SIMPLE_USE: usize = 6;

/// Accumulated answers keyed by field name.
#[derive(Debug, Clone, Default)]
pub struct Profile {
    values: BTreeMap<String, String>,
}

impl Profile {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    pub fn set(&mut self, field: &str, value: String) {
        self.values.insert(field.to_string(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Unanswered fields, essential first, in the canonical order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        ESSENTIAL_FIELDS
            .iter()
            .chain(ADVANCED_FIELDS.iter())
            .filter(|f| !self.values.contains_key(**f))
            .copied()
            .collect()
    }

    /// The answered fields, for vendor export.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.values.clone()
    }

    fn field_lower(&self, field: &str) -> String {
        self.get(field).unwrap_or("").to_lowercase()
    }
}

fn years_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)\s*(?:years?|yrs?)").unwrap())
}

/// Extract a "N years"/"N yrs" mention from free text.
pub fn years_of_experience(text: &str) -> Option<u32> {
    years_regex()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn contains_any(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| text.contains(w))
}

/// Whether to keep asking questions, given what the profile holds.
///
/// Always continues while an essential field is missing; for the advanced
/// fields, stops early when the profile reads as beginner/hobbyist and only
/// a few remain, or when at most one remains regardless of profile.
pub fn should_continue_questioning(profile: &Profile) -> bool {
    let missing = profile.missing_fields();

    // Always need essential fields
    if missing.iter().any(|f| ESSENTIAL_FIELDS.contains(f)) {
        return true;
    }

    let experience = profile.field_lower("experience_level");
    let intended_use = profile.field_lower("intended_use");

    // A profile with no parseable year count reads as junior by default.
    let years = years_of_experience(&experience).unwrap_or(0);
    let is_beginner = contains_any(&experience, &BEGINNER_WORDS) || years <= 2;
    let is_advanced = contains_any(&experience, &ADVANCED_WORDS) || years >= 6;
    let is_simple_use = contains_any(&intended_use, &SIMPLE_USE_WORDS);

    let missing_advanced: Vec<_> = missing
        .iter()
        .filter(|f| ADVANCED_FIELDS.contains(*f))
        .collect();

    // Stop early for beginners if we have enough context
    if is_beginner
        && missing_advanced.len() <= 3
        && (is_simple_use || experience.contains("student"))
    {
        return false;
    }

    // Stop early for hobby/weekend developers
    if is_simple_use && missing_advanced.len() <= 3 {
        return false;
    }

    // Time-constrained profiles get an even shorter leash
    let combined = format!("{}{}", intended_use, experience);
    if contains_any(&combined, &BUSY_WORDS) && missing_advanced.len() <= 2 {
        return false;
    }

    // Experienced developers can handle the full question list
    if is_advanced && !missing_advanced.is_empty() {
        return true;
    }

    // Down to the last advanced field is close enough
    if missing_advanced.len() <= 1 {
        return false;
    }

    true
}

/// Friendly message explaining an early stop.
pub fn stopping_reason(profile: &Profile) -> &'static str {
    let experience = profile.field_lower("experience_level");
    let intended_use = profile.field_lower("intended_use");

    let is_beginner = contains_any(
        &experience,
        &["beginner", "junior", "student", "learning", "new"],
    );
    let is_simple_use = contains_any(
        &intended_use,
        &["homework", "assignment", "learning", "hobby", "personal"],
    );

    if is_beginner || is_simple_use {
        "Perfect! I have enough information to create a helpful, focused prompt for your needs."
    } else {
        "Great! I have sufficient information to generate your personalized coding assistant prompt."
    }
}

/// Reorder the missing fields by what matters for this profile.
pub fn question_priority(profile: &Profile) -> Vec<&'static str> {
    let missing = profile.missing_fields();
    let experience = profile.field_lower("experience_level");
    let intended_use = profile.field_lower("intended_use");

    let is_beginner = contains_any(
        &experience,
        &["beginner", "junior", "student", "learning", "new"],
    );
    let is_simple_use = contains_any(
        &intended_use,
        &["homework", "assignment", "learning", "hobby", "personal"],
    );

    let order: [&'static str; 8] = if is_beginner || is_simple_use {
        [
            "intended_use",
            "primary_languages",
            "experience_level",
            "current_project",
            "testing_approach",
            "coding_style",
            "tooling_preferences",
            "workflow_process",
        ]
    } else {
        [
            "intended_use",
            "primary_languages",
            "experience_level",
            "current_project",
            "workflow_process",
            "testing_approach",
            "coding_style",
            "tooling_preferences",
        ]
    };

    order.iter().filter(|f| missing.contains(*f)).copied().collect()
}

/// Question cap for the session, tightened for beginners and hobbyists.
pub fn max_questions(profile: &Profile) -> usize {
    let experience = profile.field_lower("experience_level");
    let intended_use = profile.field_lower("intended_use");

    if contains_any(&experience, &["beginner", "student", "learning", "hobby"]) {
        MAX_QUESTIONS_BEGINNER
    } else if contains_any(
        &intended_use,
        &["homework", "learning", "hobby", "personal", "spare time"],
    ) {
        MAX_QUESTIONS_SIMPLE_USE
    } else {
        MAX_QUESTIONS_DEFAULT
    }
}

/// The planner's choice of what to ask next.
#[derive(Debug, Deserialize)]
pub struct PlannedQuestion {
    pub field: String,
    pub question: String,
}

/// Templated question used when the planner call fails.
pub fn fallback_question(field: &str) -> String {
    format!("Hey, tell me about your {} - I'm curious!", field.replace('_', " "))
}

fn planner_system(missing: &[&str], context: &ProjectContext) -> String {
    let mut system = String::from(
        r#"You are an experienced technical interviewer having a natural conversation with a developer to understand their coding practices and preferences. Your goal is to create a personalized coding assistant prompt for them.

You're adaptive, perceptive, and conversational. You:
- Pick up on context clues from previous answers
- Ask follow-up questions that feel natural
- Adapt your tone to match their experience level and communication style
- Focus on what matters most to THEIR specific situation
- Make them feel understood, not interrogated
"#,
    );

    if !context.languages.is_empty() {
        system.push_str(&format!(
            "\nIMPORTANT: This developer is working in their project directory. I can see:\n- Languages: {}\n",
            context.languages.join(", ")
        ));
        if !context.frameworks.is_empty() {
            system.push_str(&format!("- Frameworks: {}\n", context.frameworks.join(", ")));
        }
        if context.has_tests {
            system.push_str("- Has test directory\n");
        }
        if context.has_docker {
            system.push_str("- Uses Docker\n");
        }
        if context.has_git {
            system.push_str("- Uses Git\n");
        }
        if !context.ide_config.is_empty() {
            system.push_str(&format!("- IDE setup: {}\n", context.ide_config.join(", ")));
        }
        if !context.linting_tools.is_empty() {
            system.push_str(&format!(
                "- Linting tools: {}\n",
                context.linting_tools.join(", ")
            ));
        }
        system.push_str("\nUse this context to ask specific questions about their ACTUAL setup and choices.\n");
    }

    system.push_str(&format!(
        r#"
Consider their personality and context:
- If they seem junior/learning: Ask supportive questions about their learning journey
- If they're time-constrained: Focus on efficiency and practical choices
- If they're experienced: Dive into nuanced preferences and team dynamics
- If they mention specific challenges: Follow up on those pain points

Choose the MOST RELEVANT next question based on:
1. What they've already shared (build on the conversation)
2. Their apparent experience level and role
3. Their actual project setup and technology choices
4. What would give the most insight into their actual daily coding life
5. What feels like a natural follow-up to a human interviewer

Required fields to eventually cover: {}

Return valid JSON with:
  field: str   # one of the missing fields that makes most sense to ask about next
  question: str  # a natural, conversational question that feels personally relevant
"#,
        missing.join(", ")
    ));

    system
}

fn planner_user(profile: &Profile, missing: &[&str]) -> String {
    let mut user = String::from("Here's our conversation so far with this developer:\n\n");

    if profile.values.is_empty() {
        user.push_str("This is the start of our conversation.\n");
    } else {
        user.push_str("What I've learned about them:\n");
        for (field, value) in &profile.values {
            let title = field
                .split('_')
                .map(|w| {
                    let mut chars = w.chars();
                    match chars.next() {
                        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                        None => String::new(),
                    }
                })
                .collect::<Vec<_>>()
                .join(" ");
            user.push_str(&format!("- {}: {}\n", title, value));
        }
    }

    user.push_str(&format!(
        r#"
Still need to understand: {}

Based on what they've shared so far, what's the most natural and relevant question to ask next? Consider their apparent experience level, work context, and what would help me understand how they actually code day-to-day.

Make it feel like a genuine conversation between two developers, not a survey."#,
        missing.join(", ")
    ));

    user
}

/// Ask the planner for the next field and question; deterministic fallback
/// on any failure.
pub fn plan_next_question(
    profile: &Profile,
    missing: &[&str],
    context: &ProjectContext,
    generator: &dyn TextGenerator,
) -> PlannedQuestion {
    let fallback = || PlannedQuestion {
        field: missing[0].to_string(),
        question: fallback_question(missing[0]),
    };

    let reply = match generator.complete(
        &planner_system(missing, context),
        &planner_user(profile, missing),
    ) {
        Ok(reply) => reply,
        Err(e) => {
            debug!(error = %e, "planner_failed");
            return fallback();
        }
    };

    match serde_json::from_str::<PlannedQuestion>(&strip_code_fences(&reply)) {
        Ok(planned) => planned,
        Err(e) => {
            debug!(error = %e, "planner_json_malformed");
            fallback()
        }
    }
}

const LEGACY_GENERATOR_SYSTEM: &str = r#"You are a prompt generator creating ACTIONABLE coding rules. Generate a system prompt that assumes industry standard practices for the given languages and only specifies deviations, tool choices, and project-specific rules.

ASSUME industry standards by default:
- Prettier/ESLint for TypeScript/JavaScript
- Black/flake8 for Python
- gofmt/golangci-lint for Go
- Standard directory structures (src/, test/, etc.)
- Common naming conventions for each language

ONLY specify:
- Chosen tools within standard options
- Deviations from language conventions
- Project-specific requirements
- Workflow variations from standard practices
- Team-specific rules beyond language defaults

Make it practical "house rules" that complement, not replace, industry standards."#;

fn legacy_generator_user(profile: &Profile) -> String {
    let field = |name: &str| profile.get(name).unwrap_or("").to_string();
    format!(
        r#"Create coding rules assuming industry standards for {languages}:

Intended Use: {intended_use}
Primary Languages: {languages}
Coding Style: {coding_style}
Testing Approach: {testing_approach}
Tooling Preferences: {tooling_preferences}
Workflow Process: {workflow_process}
Current Project: {current_project}
Experience Level: {experience_level}

Generate rules that complement standard practices, focusing on:
- Specific tool choices (e.g., "Use Jest over Mocha", "Use pytest over unittest")
- Project-specific requirements (e.g., coverage thresholds, directory structure)
- Team workflow preferences (e.g., PR process, commit conventions)
- Deviations from defaults only where specified

Assume developers know language conventions - focus on project/team specifics."#,
        languages = field("primary_languages"),
        intended_use = field("intended_use"),
        coding_style = field("coding_style"),
        testing_approach = field("testing_approach"),
        tooling_preferences = field("tooling_preferences"),
        workflow_process = field("workflow_process"),
        current_project = field("current_project"),
        experience_level = field("experience_level"),
    )
}

/// Generate the final prompt from a legacy profile.
pub fn generate_legacy_prompt(
    profile: &Profile,
    generator: &dyn TextGenerator,
) -> Result<String, GenerationError> {
    generator.complete(LEGACY_GENERATOR_SYSTEM, &legacy_generator_user(profile))
}

/// Run the legacy field-based interview over stdin/stdout.
pub fn conduct_legacy(
    context: &ProjectContext,
    generator: &dyn TextGenerator,
    show_context: bool,
) -> Profile {
    if show_context && context.has_signals() {
        println!("Project detected: {}", context.summary());
        println!("I'll tailor questions based on your project setup.\n");
    }

    let mut profile = Profile::default();
    let mut question_count = 0;

    loop {
        let missing = profile.missing_fields();
        if missing.is_empty() || !should_continue_questioning(&profile) {
            if !missing.is_empty() {
                println!("\n{}", stopping_reason(&profile));
            }
            break;
        }

        let prioritized = question_priority(&profile);
        let missing = if prioritized.is_empty() { missing } else { prioritized };

        let planned = plan_next_question(&profile, &missing, context, generator);
        let Some(answer) = read_answer(&planned.question) else {
            info!(question_count, "legacy_interview_cancelled");
            break;
        };

        profile.set(&planned.field, answer);
        question_count += 1;

        if question_count >= max_questions(&profile) {
            println!("\nThat gives me a great understanding of your needs!");
            break;
        }
    }

    info!(question_count, "legacy_interview_complete");
    profile
}
