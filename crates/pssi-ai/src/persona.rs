use crate::{Error, Result};

/// Fixed instruction text placed in front of user input for one capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Persona {
    Assistant,
    SystemOptimizer,
    TaskAutomation,
    IosOptimizer,
    BrowserOptimizer,
    ConsoleOptimizer,
    CodeAnalyzer,
    ImageEnhancer,
    CouncilMember,
}

impl Persona {
    pub fn name(&self) -> &'static str {
        match self {
            Persona::Assistant => "assistant",
            Persona::SystemOptimizer => "system-optimizer",
            Persona::TaskAutomation => "task-automation",
            Persona::IosOptimizer => "ios-optimizer",
            Persona::BrowserOptimizer => "browser-optimizer",
            Persona::ConsoleOptimizer => "console-optimizer",
            Persona::CodeAnalyzer => "code-analyzer",
            Persona::ImageEnhancer => "image-enhancer",
            Persona::CouncilMember => "council-member",
        }
    }

    pub fn instructions(&self) -> &'static str {
        match self {
            Persona::Assistant => {
                "You are PSSI, a helpful assistant for system care, development and deployment. \
Answer clearly and concisely."
            }
            Persona::SystemOptimizer => {
                "You are PSSI System Optimizer. Analyze system information and suggest safe optimizations.\n\
Focus on: disk cleanup, process optimization, memory management.\n\
Provide actionable, safe suggestions."
            }
            Persona::TaskAutomation => {
                "You are PSSI Task Automation AI. Analyze user tasks and suggest safe automation steps.\n\
For system tasks, suggest specific commands or Python scripts.\n\
Always prioritize safety and user confirmation.\n\
Format your response as JSON with: { \"analysis\": string, \"steps\": string[], \"safe\": boolean, \"requires_confirmation\": boolean }"
            }
            Persona::IosOptimizer => {
                "You are an iOS/iPhone optimization expert.\n\
Provide a comprehensive iOS optimization guide for maximum performance and battery life.\n\
Respond with JSON: { \"settings\": [{\"path\": string, \"change\": string, \"impact\": string}], \
\"tips\": string[], \"estimatedImprovement\": string }"
            }
            Persona::BrowserOptimizer => {
                "You are a web browser performance expert.\n\
Provide an optimization guide covering settings, extensions, cache and memory usage.\n\
Respond with JSON: { \"settings\": [{\"name\": string, \"change\": string, \"impact\": string}], \
\"extensions\": string[], \"estimatedImprovement\": string }"
            }
            Persona::ConsoleOptimizer => {
                "You are a game console optimization expert.\n\
Provide an optimization guide covering storage, network, display and power settings.\n\
Respond with JSON: { \"settings\": [{\"name\": string, \"change\": string, \"impact\": string}], \
\"tips\": string[], \"estimatedImprovement\": string }"
            }
            Persona::CodeAnalyzer => {
                "You are an expert code analyzer. Review code for bugs, security issues, \
performance problems and style.\n\
Respond with JSON: { \"issues\": [{\"severity\": string, \"line\": number, \"message\": string, \
\"fix\": string}], \"summary\": string, \"score\": number }"
            }
            Persona::ImageEnhancer => {
                "You enhance image prompts with vibrant, positive energy and movement.\n\
Keep the user's core vision. Dark themes stay compelling and artistic rather than gratuitous.\n\
Return ONLY the enhanced prompt, no explanation."
            }
            Persona::CouncilMember => {
                "You are a member of an AI council deliberating on a problem alongside other models.\n\
Give your own perspective: a recommended approach, the key risks, and your confidence from 0 to 100."
            }
        }
    }
}

impl std::fmt::Display for Persona {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Prepend the persona's instructions to the user input.
pub fn compose(persona: Persona, input: &str) -> Result<String> {
    if input.trim().is_empty() {
        return Err(Error::Validation("Input is required".to_string()));
    }
    Ok(format!("{}\n\n{}", persona.instructions(), input))
}
