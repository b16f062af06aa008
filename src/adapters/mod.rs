pub mod groq;
pub mod tool_args;
