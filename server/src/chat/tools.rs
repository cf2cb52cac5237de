use include_dir::{include_dir, Dir};
use serde_json::{json, Value};

static KNOWLEDGE: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/knowledge");

/// A function the model may call; each answers with a fixed knowledge file
pub struct Tool {
    pub name: &'static str,
    pub description: &'static str,
    file: &'static str,
}

pub const TOOLS: &[Tool] = &[
    Tool {
        name: "getOverview",
        description: "Provides a welcome message and explains what {owner}'s portfolio assistant can help with, including example questions.",
        file: "overview.md",
    },
    Tool {
        name: "getSkillsOverview",
        description: "Returns {owner}'s technical skills, including languages, frameworks, state management, tools and platforms.",
        file: "skills.md",
    },
    Tool {
        name: "getExperienceOverview",
        description: "Gives an overview of {owner}'s professional experience and areas of focus.",
        file: "experience.md",
    },
    Tool {
        name: "getProjectsOverview",
        description: "Lists {owner}'s featured projects with brief descriptions.",
        file: "projects.md",
    },
    Tool {
        name: "getFeaturedProjectDetails",
        description: "Provides detailed information about {owner}'s main featured project: features, architecture and tech stack.",
        file: "featured_project.md",
    },
    Tool {
        name: "getContactInfo",
        description: "Returns ways to contact {owner}, including social profiles and resume access.",
        file: "contact.md",
    },
    Tool {
        name: "getGitHubStats",
        description: "Explains {owner}'s GitHub activity, contribution stats and where they are displayed in the portfolio.",
        file: "github.md",
    },
    Tool {
        name: "getArchitectureOverview",
        description: "Describes architecture concepts used by {owner} such as component architecture, protected routes, lazy loading and performance optimization.",
        file: "architecture.md",
    },
    Tool {
        name: "getEducationOverview",
        description: "Provides an overview of {owner}'s education and academic background.",
        file: "education.md",
    },
];

fn knowledge(file: &str) -> Option<&'static str> {
    KNOWLEDGE.get_file(file)?.contents_utf8()
}

fn personalize(text: &str, owner: &str) -> String {
    text.replace("{owner}", owner).trim().to_string()
}

pub fn system_prompt(owner: &str) -> Option<String> {
    knowledge("system_prompt.md").map(|prompt| personalize(prompt, owner))
}

/// Answers a tool call. Unknown names get an explanation instead of an error.
pub fn dispatch(name: &str, owner: &str) -> String {
    match TOOLS
        .iter()
        .find(|tool| tool.name == name)
        .and_then(|tool| knowledge(tool.file))
    {
        Some(text) => personalize(text, owner),
        None => format!(
            "Unknown tool '{name}'. Only questions covered by {owner}'s portfolio can be answered."
        ),
    }
}

/// Tool declarations in the OpenAI chat-completions format
pub fn definitions(owner: &str) -> Vec<Value> {
    TOOLS
        .iter()
        .map(|tool| {
            json!({
                "type": "function",
                "function": {
                    "name": tool.name,
                    "description": personalize(tool.description, owner),
                    "parameters": { "type": "object", "properties": {} },
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_tool_has_knowledge() {
        for tool in TOOLS {
            assert!(knowledge(tool.file).is_some(), "missing knowledge for {}", tool.name);
        }
        assert!(system_prompt("Ada").is_some());
    }

    #[test]
    fn test_dispatch_substitutes_owner() {
        let answer = dispatch("getOverview", "Ada Lovelace");

        assert!(answer.contains("Ada Lovelace's portfolio assistant"));
        assert!(!answer.contains("{owner}"));
    }

    #[test]
    fn test_dispatch_unknown_tool() {
        let answer = dispatch("getWeather", "Ada");
        assert!(answer.starts_with("Unknown tool 'getWeather'"));
    }

    #[test]
    fn test_definitions_shape() {
        let definitions = definitions("Ada");

        assert_eq!(definitions.len(), TOOLS.len());
        assert_eq!(definitions[1]["function"]["name"], "getSkillsOverview");
        assert_eq!(definitions[1]["type"], "function");
    }
}
