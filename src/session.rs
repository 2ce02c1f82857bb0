//! Interactive text session over any line-oriented input and output.
//!
//! A session logs a user in (or registers one), then serves a numbered menu
//! until the user exits or input runs out. Every prompt is written to the
//! output stream, so a session can be scripted in tests with byte slices.

use crate::error::{MediaTreeError, Result};
use crate::library::MediaLibrary;
use crate::registry::UserName;
use mediatree_types::{BoundingBox, Record};
use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::str::FromStr;

const LOGIN_PROMPT: &str = "Enter your username (or type 'new' to create a new user): ";
const NEW_USER_PROMPT: &str = "Enter new username: ";
const NEW_USER_KEYWORD: &str = "new";
const MENU: &str = "Select an option:\n\
                    1. Add new content\n\
                    2. Search content by bounding box\n\
                    3. Delete content by bounding box\n\
                    4. Exit\n";

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The user chose the exit option
    Exited,
    /// Input ran out
    EndOfInput,
    /// Login or registration was refused
    LoginRejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    EndOfInput,
}

enum Input<T> {
    Value(T),
    Invalid(String),
    Eof,
}

/// Interactive session bound to one library
pub struct Session<'a, R, W> {
    library: &'a mut MediaLibrary,
    input: R,
    output: W,
    tokens: VecDeque<String>,
}

impl<'a, R: BufRead, W: Write> Session<'a, R, W> {
    pub fn new(library: &'a mut MediaLibrary, input: R, output: W) -> Self {
        Self {
            library,
            input,
            output,
            tokens: VecDeque::new(),
        }
    }

    /// Run the session to completion.
    ///
    /// Only failures to read input or write output are returned as errors;
    /// everything else is reported to the user and the session goes on.
    pub fn run(&mut self) -> Result<SessionEnd> {
        let user = match self.login()? {
            Input::Value(user) => user,
            Input::Invalid(_) => return Ok(SessionEnd::LoginRejected),
            Input::Eof => return Ok(SessionEnd::EndOfInput),
        };
        log::info!("Session started for '{}'", user);

        loop {
            self.prompt(MENU)?;
            let Some(line) = self.read_line()? else {
                return Ok(SessionEnd::EndOfInput);
            };

            let flow = match line.trim() {
                "1" => self.add(&user)?,
                "2" => self.search(&user)?,
                "3" => self.delete(&user)?,
                "4" => {
                    writeln!(self.output, "Exiting the program.")?;
                    writeln!(self.output, "Goodbye!")?;
                    return Ok(SessionEnd::Exited);
                }
                _ => {
                    writeln!(self.output, "Invalid option.")?;
                    Flow::Continue
                }
            };
            self.tokens.clear();

            if flow == Flow::EndOfInput {
                return Ok(SessionEnd::EndOfInput);
            }
        }
    }

    fn login(&mut self) -> Result<Input<UserName>> {
        self.prompt(LOGIN_PROMPT)?;
        let Some(line) = self.read_line()? else {
            return Ok(Input::Eof);
        };
        let name = line.trim();

        if name == NEW_USER_KEYWORD {
            self.prompt(NEW_USER_PROMPT)?;
            let Some(line) = self.read_line()? else {
                return Ok(Input::Eof);
            };

            return match self.library.create_user(line.trim()) {
                Ok(user) => Ok(Input::Value(user)),
                Err(MediaTreeError::UserExists(name)) => {
                    writeln!(self.output, "Username already exists. Try logging in.")?;
                    Ok(Input::Invalid(name))
                }
                Err(e) => {
                    writeln!(self.output, "{}", e)?;
                    Ok(Input::Invalid(e.to_string()))
                }
            };
        }

        if !self.library.has_user(name) {
            writeln!(self.output, "Username not found. Please try again.")?;
            return Ok(Input::Invalid(name.to_string()));
        }

        Ok(Input::Value(UserName::parse(name)?))
    }

    fn add(&mut self, user: &UserName) -> Result<Flow> {
        self.prompt("Enter content ID: ")?;
        let id = match self.read_value::<i64>()? {
            Input::Value(id) => id,
            Input::Invalid(reason) => return self.reject(&reason),
            Input::Eof => return Ok(Flow::EndOfInput),
        };

        self.prompt("Enter title: ")?;
        let Some(title) = self.read_line()? else {
            return Ok(Flow::EndOfInput);
        };
        self.prompt("Enter tags: ")?;
        let Some(tags) = self.read_line()? else {
            return Ok(Flow::EndOfInput);
        };

        self.prompt("Enter bounding box coordinates (xmin ymin xmax ymax): ")?;
        let bbox = match self.read_bbox()? {
            Input::Value(bbox) => bbox,
            Input::Invalid(reason) => return self.reject(&reason),
            Input::Eof => return Ok(Flow::EndOfInput),
        };

        match self.library.add(user.as_str(), Record::new(id, title, tags, bbox)) {
            Ok(outcome) => {
                if let Some(warning) = outcome.warning {
                    writeln!(self.output, "Warning: content was not saved: {}", warning)?;
                }
                writeln!(self.output, "Content added successfully.")?;
            }
            Err(e) => writeln!(self.output, "Error: {}", e)?,
        }
        Ok(Flow::Continue)
    }

    fn search(&mut self, user: &UserName) -> Result<Flow> {
        self.prompt("Enter bounding box coordinates to search (xmin ymin xmax ymax): ")?;
        let query = match self.read_bbox()? {
            Input::Value(bbox) => bbox,
            Input::Invalid(reason) => return self.reject(&reason),
            Input::Eof => return Ok(Flow::EndOfInput),
        };

        match self.library.search_to_report(user.as_str(), &query) {
            Ok(summary) => {
                writeln!(self.output, "Found {} matching record(s).", summary.matches)?;
                writeln!(
                    self.output,
                    "Search results saved to '{}'.",
                    summary.path.display()
                )?;
            }
            Err(e) => writeln!(self.output, "Unable to write search results: {}", e)?,
        }
        Ok(Flow::Continue)
    }

    fn delete(&mut self, user: &UserName) -> Result<Flow> {
        self.prompt("Enter bounding box coordinates to delete (xmin ymin xmax ymax): ")?;
        let query = match self.read_bbox()? {
            Input::Value(bbox) => bbox,
            Input::Invalid(reason) => return self.reject(&reason),
            Input::Eof => return Ok(Flow::EndOfInput),
        };

        match self.library.delete(user.as_str(), &query) {
            Ok(outcome) => {
                writeln!(self.output, "Deleted {} record(s).", outcome.value)?;
                if let Some(warning) = outcome.warning {
                    writeln!(self.output, "Warning: changes were not saved: {}", warning)?;
                }
                writeln!(self.output, "Content deleted successfully.")?;
            }
            Err(e) => writeln!(self.output, "Error: {}", e)?,
        }
        Ok(Flow::Continue)
    }

    fn reject(&mut self, reason: &str) -> Result<Flow> {
        writeln!(self.output, "Invalid input: {}", reason)?;
        Ok(Flow::Continue)
    }

    fn prompt(&mut self, text: &str) -> Result<()> {
        self.output.write_all(text.as_bytes())?;
        self.output.flush()?;
        Ok(())
    }

    /// Next full input line without its line terminator, or `None` at end of input.
    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    /// Next whitespace-separated token, reading further lines as needed.
    fn read_token(&mut self) -> Result<Option<String>> {
        while self.tokens.is_empty() {
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            self.tokens
                .extend(line.split_whitespace().map(str::to_string));
        }
        Ok(self.tokens.pop_front())
    }

    fn read_value<T>(&mut self) -> Result<Input<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let Some(token) = self.read_token()? else {
            return Ok(Input::Eof);
        };
        let value = match token.parse::<T>() {
            Ok(value) => Input::Value(value),
            Err(e) => Input::Invalid(format!("'{}': {}", token, e)),
        };
        // The rest of the line belongs to this answer
        self.tokens.clear();
        Ok(value)
    }

    fn read_bbox(&mut self) -> Result<Input<BoundingBox>> {
        let mut coords = [0.0f64; 4];
        for slot in coords.iter_mut() {
            let Some(token) = self.read_token()? else {
                return Ok(Input::Eof);
            };
            match token.parse::<f64>() {
                Ok(value) => *slot = value,
                Err(e) => return Ok(Input::Invalid(format!("'{}': {}", token, e))),
            }
        }
        self.tokens.clear();
        Ok(Input::Value(BoundingBox::new(
            coords[0], coords[1], coords[2], coords[3],
        )))
    }
}
