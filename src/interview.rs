//! The adaptive interview state machine.
//!
//! Decides, turn by turn, which question to ask next and when to stop,
//! blending static heuristics with text-generation calls. Every external
//! call is wrapped: on failure the machine degrades to a deterministic
//! fallback, so the interview can always run to completion with the service
//! down.

use std::io::{self, Write};

use tracing::{debug, info, warn};

use crate::context::ProjectContext;
use crate::insights::{self, Insights};
use crate::llm::TextGenerator;

/// One question/answer turn. Immutable once recorded; ordering is
/// significant.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub question: String,
    pub answer: String,
}

/// Coarse classification of who we're talking to, re-derived after every
/// exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeveloperType {
    Learning,
    Portfolio,
    Professional,
    General,
}

impl DeveloperType {
    pub fn label(&self) -> &'static str {
        match self {
            DeveloperType::Learning => "learning_developer",
            DeveloperType::Portfolio => "portfolio_developer",
            DeveloperType::Professional => "professional_developer",
            DeveloperType::General => "general_developer",
        }
    }
}

/// Never ask fewer than this many questions.
const MIN_EXCHANGES: usize = 2;

/// Never ask more than this many questions, regardless of what the
/// stop-assessment says.
pub const MAX_EXCHANGES: usize = 6;

/// When the stop-assessment call fails or replies with garbage, continue
/// while depth is below this.
const FALLBACK_CONTINUE_DEPTH: usize = 4;

/// Opening question when nothing was detected in the working directory.
pub const GENERIC_OPENER: &str = "What brings you to use this coding assistant today?";

/// Generic follow-ups used when question generation is unavailable, indexed
/// by depth.
const FALLBACK_QUESTIONS: [&str; 4] = [
    "What programming languages do you work with most often?",
    "How would you describe your experience level with coding?",
    "What kind of project are you currently working on?",
    "What do you find most challenging about your current development work?",
];

const CATCH_ALL_QUESTION: &str = "What would be most helpful for your coding workflow?";

/// Accumulated state of one interview session.
///
/// Created once per session, mutated only by recording exchanges, and
/// discarded after the prompt is generated.
pub struct InterviewState {
    exchanges: Vec<Exchange>,
    insights: Insights,
    project_context: ProjectContext,
    developer_type: DeveloperType,
}

impl InterviewState {
    pub fn new(project_context: ProjectContext) -> Self {
        Self {
            exchanges: Vec::new(),
            insights: Insights::default(),
            project_context,
            developer_type: DeveloperType::General,
        }
    }

    /// Number of recorded exchanges.
    pub fn depth(&self) -> usize {
        self.exchanges.len()
    }

    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    pub fn insights(&self) -> &Insights {
        &self.insights
    }

    pub fn project_context(&self) -> &ProjectContext {
        &self.project_context
    }

    pub fn developer_type(&self) -> DeveloperType {
        self.developer_type
    }

    /// The full conversation as "Q:/A:" lines, the shape every model
    /// instruction embeds.
    pub fn transcript(&self) -> String {
        let mut text = String::new();
        for exchange in &self.exchanges {
            text.push_str(&format!(
                "Q: {}\nA: {}\n",
                exchange.question, exchange.answer
            ));
        }
        text
    }

    /// Record one exchange, then re-derive insights and developer type.
    ///
    /// Insight extraction only starts once there is enough conversation to
    /// analyze (two exchanges); a failed extraction leaves prior insights
    /// untouched.
    pub fn record(&mut self, question: &str, answer: &str, generator: &dyn TextGenerator) {
        self.exchanges.push(Exchange {
            question: question.to_string(),
            answer: answer.to_string(),
        });
        debug!(depth = self.depth(), "exchange_recorded");

        if self.depth() >= MIN_EXCHANGES
            && let Some(extracted) = insights::extract(&self.transcript(), generator)
        {
            self.insights.apply(extracted);
        }
        self.derive_developer_type();
    }

    /// Priority cascade, first match wins.
    fn derive_developer_type(&mut self) {
        self.developer_type = if self.insights.learning_focused == Some(true) {
            DeveloperType::Learning
        } else if self.project_context.project_type.as_deref() == Some("portfolio") {
            DeveloperType::Portfolio
        } else if self.project_context.has_tests && !self.project_context.ci_cd.is_empty() {
            DeveloperType::Professional
        } else {
            DeveloperType::General
        };
    }

    /// Decide whether to ask another question.
    ///
    /// The first two questions always happen and the seventh never does; in
    /// between, the model judges transcript sufficiency, falling back to a
    /// simple depth rule when it can't.
    pub fn should_continue(&self, generator: &dyn TextGenerator) -> bool {
        if self.depth() < MIN_EXCHANGES {
            return true;
        }
        if self.depth() >= MAX_EXCHANGES {
            return false;
        }

        let reply = match generator.complete(
            ASSESSMENT_SYSTEM,
            &self.assessment_instructions(),
        ) {
            Ok(reply) => reply,
            Err(e) => {
                debug!(error = %e, "stop_assessment_failed");
                return self.depth() < FALLBACK_CONTINUE_DEPTH;
            }
        };

        let decision = reply.trim().to_uppercase();
        if decision.starts_with("STOP") {
            info!(depth = self.depth(), "stop_assessment_stop");
            false
        } else if decision.starts_with("CONTINUE") {
            true
        } else {
            warn!(reply = %reply, "stop_assessment_unparsable");
            self.depth() < FALLBACK_CONTINUE_DEPTH
        }
    }

    /// Produce the next question to ask.
    pub fn next_question(&self, generator: &dyn TextGenerator) -> String {
        if self.depth() == 0 {
            // Static opener, folded with the detected language list when
            // there is one. Depth 0 never calls the service.
            if self.project_context.languages.is_empty() {
                return GENERIC_OPENER.to_string();
            }
            return format!(
                "I see you're working with {} - what brings you to use this coding assistant today?",
                self.project_context.languages.join(", ")
            );
        }

        match generator.complete(INTERVIEWER_SYSTEM, &self.interviewer_instructions()) {
            Ok(question) => question.trim().to_string(),
            Err(e) => {
                debug!(error = %e, depth = self.depth(), "question_generation_failed");
                FALLBACK_QUESTIONS
                    .get(self.depth() - 1)
                    .copied()
                    .unwrap_or(CATCH_ALL_QUESTION)
                    .to_string()
            }
        }
    }

    /// One more unconditional extraction pass over the full transcript.
    /// Idempotent on an unchanged transcript, modulo model nondeterminism.
    pub fn finalize(&mut self, generator: &dyn TextGenerator) {
        if self.exchanges.is_empty() {
            return;
        }
        if let Some(extracted) = insights::extract(&self.transcript(), generator) {
            self.insights.apply(extracted);
        }
        self.derive_developer_type();
    }

    /// Short summary of what the interview learned.
    pub fn summary(&self) -> String {
        if self.exchanges.is_empty() {
            return "Learning about developer...".to_string();
        }

        let mut parts = Vec::new();

        if !self.project_context.languages.is_empty() {
            parts.push(format!(
                "Working with: {}",
                self.project_context.languages.join(", ")
            ));
        }
        if !self.insights.languages.is_empty() {
            parts.push(format!("Uses: {}", self.insights.languages.join(", ")));
        }
        if let Some(focus) = &self.insights.project_focus {
            parts.push(format!("Focus: {}", focus));
        }
        parts.push(format!("Type: {}", self.developer_type.label()));

        parts.join(" | ")
    }

    fn assessment_instructions(&self) -> String {
        format!(
            r#"Based on this conversation, do you have enough information to create a high-quality, personalized coding assistant prompt?

Project Context: {context}
Conversation:
{transcript}
Current Insights: {insights}

ANALYSIS CHECKLIST:
- Are their responses specific and detailed, or generic and vague?
- Have they shared actual challenges/pain points, or just mentioned surface-level issues?
- Do their answers reveal real workflow details, or seem to avoid discussing problems?
- Is there a sense they're holding back important information about their situation?
- Would one more targeted question likely reveal critical missing context?

Should I CONTINUE asking questions or STOP here? Respond with "CONTINUE" or "STOP" and brief reasoning."#,
            context = self.project_context.to_json(),
            transcript = self.transcript(),
            insights = self.insights.to_json(),
        )
    }

    fn interviewer_instructions(&self) -> String {
        format!(
            r#"Based on this conversation so far, what should be your next question?

Project Context: {context}
Conversation History:
{transcript}

Current insights gathered: {insights}

Generate one focused question that will help understand their coding workflow and preferences. Keep it conversational and natural."#,
            context = self.project_context.to_json(),
            transcript = self.transcript(),
            insights = self.insights.to_json(),
        )
    }
}

const ASSESSMENT_SYSTEM: &str = r#"You are an expert at determining when you have gathered enough information to create a personalized coding assistant prompt.

Your assessment criteria:
- Do you understand their experience level and background?
- Do you know what technologies/languages they work with?
- Do you understand their current project or work context?
- Have they shared specific challenges, preferences, or workflow details?
- Can you create a useful, personalized coding assistant prompt from this information?

CRITICAL: Be AGGRESSIVE about detecting shallow or evasive responses:
- Generic answers like "legacy codebase is challenging" or "optimization issues" are RED FLAGS
- Vague mentions without specifics (e.g., "technical debt", "performance bottlenecks") are INSUFFICIENT
- If they mention problems but won't give details about team, testing, deployment, documentation - CONTINUE
- If they sound professional but aren't revealing actual pain points or workflow realities - CONTINUE
- Technical jargon without context about real challenges means you need MORE information
- If conversation feels surface-level or like they're being careful/reserved - PUSH DEEPER

BIAS TOWARD CONTINUING: Unless you have rich, specific details about their actual challenges, team situation, workflow problems, or personal context - CONTINUE asking questions. It's better to ask too many than miss critical information.

Your decision-making philosophy:
- CONTINUE if responses feel generic, professional, or evasive
- CONTINUE if you sense they're holding back important context
- CONTINUE if they mention problems but won't elaborate on impact/details
- CONTINUE if their answers could apply to any developer in their situation
- ONLY STOP when you have specific, actionable insights about their unique situation

Respond with ONLY "CONTINUE" or "STOP" followed by a brief reason."#;

const INTERVIEWER_SYSTEM: &str = r#"You are an expert technical interviewer conducting a brief conversation to understand a developer's needs for creating a personalized coding assistant prompt.

Your personality and goals:
- You are professional, friendly, and efficient
- You ask focused questions that reveal key information about their workflow, experience, and preferences
- You adapt your questions based on their responses and project context
- You aim to understand their coding practices, challenges, and goals in 3-4 questions total
- You avoid overwhelming them with too many questions
- You're genuinely interested in helping them get the most relevant coding assistance

Your questioning strategy:
- Build on their previous answers
- Focus on actionable insights about their coding workflow
- Ask about specific challenges or preferences they might have
- Tailor questions to their apparent experience level and project type
- Do not repeat a question that has already been asked

Generate the next question that would be most valuable for understanding their coding assistant needs."#;

/// Run the full interactive interview over stdin/stdout.
///
/// EOF or an empty answer ends the session immediately; exchanges recorded
/// so far are kept and summarized.
pub fn conduct(
    project_context: ProjectContext,
    generator: &dyn TextGenerator,
    show_context: bool,
) -> InterviewState {
    if show_context && project_context.has_signals() {
        println!("Project detected: {}", project_context.summary());
        println!("I'll tailor questions based on your project setup.\n");
    }

    let mut interview = InterviewState::new(project_context);
    let mut question = interview.next_question(generator);

    while interview.should_continue(generator) {
        let Some(answer) = read_answer(&question) else {
            println!("\nThanks for the conversation!");
            info!(depth = interview.depth(), "interview_cancelled");
            break;
        };
        if answer.is_empty() {
            break;
        }

        interview.record(&question, &answer, generator);

        if interview.should_continue(generator) {
            question = interview.next_question(generator);
        } else {
            break;
        }
    }

    interview.finalize(generator);

    if !interview.exchanges().is_empty() {
        println!("\nGreat! I have a good understanding of your needs.");
        println!("Summary: {}", interview.summary());
    }

    info!(depth = interview.depth(), "interview_complete");
    interview
}

/// Prompt for one answer. Returns `None` on EOF or a read error
/// (cancellation).
pub(crate) fn read_answer(question: &str) -> Option<String> {
    print!("{} > ", question);
    let _ = io::stdout().flush();

    let mut line = String::new();
    match io::stdin().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim().to_string()),
    }
}
