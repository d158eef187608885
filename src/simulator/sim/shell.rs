use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::error::Result;

pub enum Command {
  Step(u32), // Step N cycles
  Print,
  Quit,
  Continue,
}

pub struct Shell {
  editor: DefaultEditor,
}

impl Shell {
  pub fn new() -> Result<Self> {
    Ok(Self {
      editor: DefaultEditor::new()?,
    })
  }

  pub fn read_command(&mut self) -> Result<Command> {
    loop {
      match self.editor.readline("(segseq) ") {
        Ok(line) => {
          let trimmed = line.trim();

          if !trimmed.is_empty() {
            let _ = self.editor.add_history_entry(trimmed);
          }

          match parse_command(trimmed) {
            Ok(cmd) => return Ok(cmd),
            Err(msg) => eprintln!("{}", msg),
          }
        },
        // Ctrl-C / Ctrl-D: quit
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => return Ok(Command::Quit),
        Err(err) => return Err(err.into()),
      }
    }
  }
}

/// Empty line steps once, `si N` steps N cycles
pub fn parse_command(input: &str) -> std::result::Result<Command, String> {
  if input.is_empty() {
    return Ok(Command::Step(1));
  }

  if let Some(rest) = input.strip_prefix("si") {
    let num_str = rest.trim();
    if num_str.is_empty() {
      return Err("Error: 'si' requires a number, e.g., 'si 100'".to_string());
    }
    return match num_str.parse::<u32>() {
      Ok(n) if n > 0 => Ok(Command::Step(n)),
      Ok(_) => Err("Error: step count must be greater than 0".to_string()),
      Err(e) => Err(format!("Error: invalid number '{}': {}", num_str, e)),
    };
  }

  match input {
    "q" => Ok(Command::Quit),
    "c" => Ok(Command::Continue),
    "p" => Ok(Command::Print),
    _ => Err(format!(
      "Unknown command: '{}'. Use Enter to step, 'si 100' to step N cycles, 'p' to print, 'c' to continue, 'q' to quit",
      input
    )),
  }
}
