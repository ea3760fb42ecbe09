//! Prompt synthesis.
//!
//! Selects one instruction template based on a strategy label and makes a
//! single generation call to produce the final prompt. When no label was
//! supplied, one classification call sorts the developer into
//! beginner/intermediate/advanced, defaulting to intermediate on any
//! failure. Exactly one template pair renders per synthesis; templates are
//! never blended.

use tracing::{debug, info, warn};

use crate::interview::InterviewState;
use crate::llm::{GenerationError, TextGenerator};

/// Which instruction template synthesizes the final prompt.
///
/// `Educational` and `Emergency` are only reachable through an externally
/// supplied label; classification maps onto the other three.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Educational,
    Emergency,
    Advanced,
    Beginner,
    Generic,
}

impl Strategy {
    pub fn label(&self) -> &'static str {
        match self {
            Strategy::Educational => "educational",
            Strategy::Emergency => "emergency",
            Strategy::Advanced => "advanced",
            Strategy::Beginner => "beginner",
            Strategy::Generic => "generic",
        }
    }
}

/// Experience level as classified from the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExperienceLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl ExperienceLevel {
    fn strategy(self) -> Strategy {
        match self {
            ExperienceLevel::Beginner => Strategy::Beginner,
            ExperienceLevel::Intermediate => Strategy::Generic,
            ExperienceLevel::Advanced => Strategy::Advanced,
        }
    }
}

const CLASSIFICATION_SYSTEM: &str = "You determine developer experience levels.";

/// One classification call; intermediate on any failure or unexpected token.
pub fn classify_experience(
    transcript: &str,
    generator: &dyn TextGenerator,
) -> ExperienceLevel {
    let instructions = format!(
        r#"Based on this conversation, what is the developer's experience level?

Conversation:
{transcript}

Respond with just one word: "beginner", "intermediate", or "advanced"
- beginner: New to coding, learning basics, less than 2 years experience
- intermediate: Some experience, 2-5 years, comfortable with basics
- advanced: Senior level, 5+ years, leads projects/teams"#
    );

    match generator.complete(CLASSIFICATION_SYSTEM, &instructions) {
        Ok(reply) => match reply.trim().to_lowercase().as_str() {
            "beginner" => ExperienceLevel::Beginner,
            "advanced" => ExperienceLevel::Advanced,
            "intermediate" => ExperienceLevel::Intermediate,
            other => {
                warn!(reply = %other, "experience_classification_unexpected");
                ExperienceLevel::Intermediate
            }
        },
        Err(e) => {
            debug!(error = %e, "experience_classification_failed");
            ExperienceLevel::Intermediate
        }
    }
}

/// Synthesize the final prompt from a completed interview.
///
/// This is the one call site whose failure does surface: there is no
/// deterministic stand-in for the artifact itself.
pub fn generate_prompt(
    interview: &InterviewState,
    strategy: Option<Strategy>,
    generator: &dyn TextGenerator,
) -> Result<String, GenerationError> {
    let strategy = strategy.unwrap_or_else(|| {
        classify_experience(&interview.transcript(), generator).strategy()
    });
    info!(strategy = strategy.label(), "prompt_synthesis");

    let (system, user) = render_instructions(strategy, interview);
    generator.complete(&system, &user)
}

/// Render exactly one template pair for the chosen strategy.
fn render_instructions(strategy: Strategy, interview: &InterviewState) -> (String, String) {
    let transcript = interview.transcript();
    let developer_type = interview.developer_type().label();
    let insights = interview.insights().to_json();
    let context = interview.project_context().to_json();

    let (system, user) = match strategy {
        Strategy::Educational => (
            EDUCATIONAL_SYSTEM,
            format!(
                r#"Based on this conversation with a developer who wants to learn and improve their coding skills, create a supportive coding assistant prompt:

**Conversation:**
{transcript}

**Developer Profile:** {developer_type} (learning-focused)
**Learning Goals:** {insights}
**Project Context:** {context}

Generate a learning-focused prompt that includes:
- Foundational coding practices with explanations
- Educational context for WHY practices matter
- Learning resources and next steps for growth
- Supportive, encouraging language
- Gradual introduction of best practices
- Confidence-building guidance

Make it educational and supportive. Focus on building understanding and good habits over time."#
            ),
        ),
        Strategy::Emergency => (
            EMERGENCY_SYSTEM,
            format!(
                r#"Based on this conversation with a non-programmer facing a technical emergency, create an extremely practical, crisis-resolution prompt:

**Conversation:**
{transcript}

**User Profile:** {developer_type} (emergency crisis situation)
**Crisis Details:** {insights}
**System Context:** {context}

Generate a CRISIS-RESOLUTION prompt that includes ONLY:
- Step-by-step instructions for non-programmers
- The absolute minimum needed to fix the problem
- Direct commands they can copy and paste
- Simple troubleshooting steps
- Skip ALL non-essential activities
- Focus on getting the system working again

AVOID completely:
- Testing frameworks or coverage
- Code formatting tools
- Git workflows and conventions
- "Best practices" or "industry standards"
- Complex explanations
- Anything not directly related to fixing the crisis

Make it emergency-focused. They need it working NOW."#
            ),
        ),
        Strategy::Advanced => (
            ADVANCED_SYSTEM,
            format!(
                r#"Based on this conversation with an experienced developer, create a professional coding assistant prompt:

**Conversation:**
{transcript}

**Developer Profile:** {developer_type} (advanced level)
**Professional Context:** {insights}
**Project Context:** {context}

Generate a sophisticated prompt that includes:
- Advanced architectural and design patterns
- Team leadership and code review practices
- Professional workflow and tool optimizations
- Scaling and performance considerations
- Mentoring and knowledge sharing approaches
- Enterprise-level best practices

Make it professionally focused and respect their expertise. Address complex scenarios and trade-offs."#
            ),
        ),
        Strategy::Beginner => (
            BEGINNER_SYSTEM,
            format!(
                r#"Based on this conversation with a beginner developer, create a supportive coding assistant prompt:

**Conversation:**
{transcript}

**Developer Profile:** {developer_type} (beginner level)
**Learning Focus:** {insights}
**Project Context:** {context}

Generate a beginner-friendly prompt that includes ONLY:
- Essential coding practices for their current project
- Simple, beginner-appropriate tools
- Learning resources and explanations
- Encouragement for experimentation
- Basic workflow suggestions

Keep it supportive and avoid overwhelming them with too many tools or complex concepts."#
            ),
        ),
        Strategy::Generic => (
            GENERIC_SYSTEM,
            format!(
                r#"Based on this conversation with a developer, create a balanced coding assistant prompt:

**Conversation:**
{transcript}

**Developer Profile:** {developer_type}
**Key Insights:** {insights}
**Project Context:** {context}

Generate a practical prompt that includes:
- Essential coding practices for their project
- Appropriate testing approach and tools
- Code formatting preferences (assume industry standards)
- Basic workflow suggestions
- Language-specific guidance for their stack

Make it actionable and specific to their context, but avoid overwhelming them with too many recommendations."#
            ),
        ),
    };

    (system.to_string(), user)
}

const EDUCATIONAL_SYSTEM: &str = r#"You are an expert at creating personalized coding assistant prompts for LEARNING-FOCUSED developers. These are people genuinely interested in growing their programming skills. Create a supportive, educational prompt that helps them learn and improve.

Your task is to:
1. Create guidance that builds understanding and knowledge
2. Focus on foundational practices and concepts
3. Include educational explanations for WHY practices matter
4. Provide learning resources and growth paths
5. Use encouraging, supportive language
6. Build confidence while introducing best practices gradually

Create a prompt that supports their learning journey and skill development."#;

const EMERGENCY_SYSTEM: &str = r#"You are an expert at creating MINIMAL, CRISIS-RESOLUTION coding assistant prompts for non-programmers facing technical emergencies. These users have zero programming experience and just need to fix something broken.

CRITICAL REQUIREMENTS:
1. NO testing frameworks or coverage requirements
2. NO complex tooling setups (no ESLint, Prettier, etc.)
3. NO git workflows, branching, or pull requests
4. NO "best practices" - focus on "works quickly"
5. NO educational explanations - just direct instructions
6. NO industry standards - use whatever is simplest
7. Step-by-step instructions for non-programmers
8. Focus on immediate crisis resolution

Your goal: Create the FASTEST path to fixing the broken system."#;

const ADVANCED_SYSTEM: &str = r#"You are an expert at creating personalized coding assistant prompts for EXPERIENCED developers. Based on a conversation with a senior developer, create a sophisticated prompt that respects their expertise.

Your task is to:
1. Generate advanced, nuanced guidance
2. Focus on architectural decisions and trade-offs
3. Address team leadership and mentoring aspects
4. Include professional workflow optimizations
5. Respect their experience and judgment
6. Cover scaling and enterprise considerations

Create a prompt that enhances their professional effectiveness."#;

const BEGINNER_SYSTEM: &str = r#"You are an expert at creating personalized coding assistant prompts for BEGINNER developers. Based on a conversation with a new developer, create a supportive, learning-focused prompt that won't overwhelm them.

Your task is to:
1. Focus on foundational practices and learning
2. Prioritize essential tools and workflows
3. Include educational resources and explanations
4. Keep recommendations simple and actionable
5. Encourage growth and experimentation

Create a prompt that supports their learning journey without overwhelming them."#;

const GENERIC_SYSTEM: &str = r#"You are an expert at creating personalized coding assistant prompts. Based on a natural conversation with a developer, create a balanced, practical prompt that will make their coding assistant more helpful.

Your task is to:
1. Synthesize insights from the conversation
2. Consider their project context and experience level
3. Generate practical, actionable instructions
4. Focus on essential practices and tools
5. Make assumptions about industry standards they likely follow

Create a prompt that feels personalized but not overwhelming."#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ProjectContext;
    use crate::llm::testing::{FixedGenerator, ScriptedGenerator};

    fn interview_with_one_exchange() -> InterviewState {
        let generator = ScriptedGenerator::failing();
        let mut interview = InterviewState::new(ProjectContext::default());
        interview.record("What languages?", "Mostly Rust", &generator);
        interview
    }

    #[test]
    fn test_classify_beginner() {
        let generator = FixedGenerator::new("beginner");
        assert_eq!(
            classify_experience("Q: x\nA: y\n", &generator),
            ExperienceLevel::Beginner
        );
    }

    #[test]
    fn test_classify_tolerates_case_and_whitespace() {
        let generator = FixedGenerator::new("  Advanced \n");
        assert_eq!(
            classify_experience("Q: x\nA: y\n", &generator),
            ExperienceLevel::Advanced
        );
    }

    #[test]
    fn test_classify_unexpected_token_defaults_to_intermediate() {
        let generator = FixedGenerator::new("They seem quite capable to me.");
        assert_eq!(
            classify_experience("Q: x\nA: y\n", &generator),
            ExperienceLevel::Intermediate
        );
    }

    #[test]
    fn test_classify_failure_defaults_to_intermediate() {
        let generator = ScriptedGenerator::failing();
        assert_eq!(
            classify_experience("Q: x\nA: y\n", &generator),
            ExperienceLevel::Intermediate
        );
    }

    #[test]
    fn test_explicit_strategy_skips_classification() {
        // Only one reply is scripted; with an explicit strategy it must be
        // consumed by the synthesis call, not by classification.
        let generator = ScriptedGenerator::new(&["the generated prompt"]);
        let interview = interview_with_one_exchange();

        let prompt =
            generate_prompt(&interview, Some(Strategy::Emergency), &generator).unwrap();
        assert_eq!(prompt, "the generated prompt");
    }

    #[test]
    fn test_unset_strategy_classifies_then_generates() {
        let generator = ScriptedGenerator::new(&["advanced", "the generated prompt"]);
        let interview = interview_with_one_exchange();

        let prompt = generate_prompt(&interview, None, &generator).unwrap();
        assert_eq!(prompt, "the generated prompt");
    }

    #[test]
    fn test_generation_failure_propagates() {
        let generator = ScriptedGenerator::failing();
        let interview = interview_with_one_exchange();

        // Classification falls back to intermediate, but the final call has
        // no fallback and must surface the error.
        assert!(generate_prompt(&interview, None, &generator).is_err());
    }

    #[test]
    fn test_emergency_template_forbids_tooling_talk() {
        let interview = interview_with_one_exchange();
        let (system, user) = render_instructions(Strategy::Emergency, &interview);

        assert!(system.contains("NO testing frameworks"));
        assert!(system.contains("NO git workflows"));
        assert!(user.contains("Testing frameworks or coverage"));
        assert!(user.contains("CRISIS-RESOLUTION"));
    }

    #[test]
    fn test_advanced_template_mandates_architecture_and_mentoring() {
        let interview = interview_with_one_exchange();
        let (system, user) = render_instructions(Strategy::Advanced, &interview);

        assert!(system.contains("architectural decisions and trade-offs"));
        assert!(system.contains("mentoring"));
        assert!(user.contains("Mentoring and knowledge sharing"));
    }

    #[test]
    fn test_templates_embed_transcript() {
        let interview = interview_with_one_exchange();
        for strategy in [
            Strategy::Educational,
            Strategy::Emergency,
            Strategy::Advanced,
            Strategy::Beginner,
            Strategy::Generic,
        ] {
            let (_, user) = render_instructions(strategy, &interview);
            assert!(
                user.contains("Q: What languages?"),
                "{} template lost the transcript",
                strategy.label()
            );
        }
    }

    #[test]
    fn test_experience_maps_to_strategy() {
        assert_eq!(ExperienceLevel::Beginner.strategy(), Strategy::Beginner);
        assert_eq!(ExperienceLevel::Intermediate.strategy(), Strategy::Generic);
        assert_eq!(ExperienceLevel::Advanced.strategy(), Strategy::Advanced);
    }
}
