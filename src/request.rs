// Travel request file parsing
//
// A request file holds one or more blocks:
//
//   begin
//   airports: OAK, SFO -> PHX
//   dates: 05/15, 05/16 -> 05/20
//   $250
//   end
//
// The right-hand side of `dates:` may be empty for a one-way search.
// Blank lines and lines starting with `#` are ignored.

use std::path::Path;

use thiserror::Error;

use crate::flight::Money;

#[derive(Error, Debug, PartialEq)]
pub enum RequestError {
    #[error("Line {line}: unknown field '{field}'")]
    UnknownField { line: usize, field: String },

    #[error("Line {line}: field '{field}' given twice")]
    DuplicateField { line: usize, field: String },

    #[error("Block starting at line {line}: missing field '{field}'")]
    MissingField { line: usize, field: String },

    #[error("Line {line}: expected '<left> -> <right>' in '{field}'")]
    MissingArrow { line: usize, field: String },

    #[error("Line {line}: no {side} airports given")]
    NoAirports { line: usize, side: String },

    #[error("Line {line}: no leave dates given")]
    NoLeaveDates { line: usize },

    #[error("Line {line}: invalid budget '{value}'")]
    InvalidBudget { line: usize, value: String },

    #[error("Line {line}: 'begin' inside an open block")]
    NestedBlock { line: usize },

    #[error("Line {line}: 'end' without 'begin'")]
    UnexpectedEnd { line: usize },

    #[error("Line {line}: '{content}' outside a begin/end block")]
    OutsideBlock { line: usize, content: String },

    #[error("Block starting at line {line} is never closed")]
    UnterminatedBlock { line: usize },

    #[error("I/O error: {0}")]
    IoError(String),
}

// One parsed travel request: flexible airports, flexible dates and a budget
#[derive(Debug, Clone, PartialEq)]
pub struct TravelRequest {
    pub source_airports: Vec<String>,
    pub destination_airports: Vec<String>,
    pub leave_dates: Vec<String>,
    pub return_dates: Vec<String>,
    pub budget: Money,
}

impl TravelRequest {
    // Checks that hold regardless of where the request came from
    pub fn validate(&self) -> Result<(), RequestError> {
        if !self.budget.is_finite() || self.budget < 0.0 {
            return Err(RequestError::InvalidBudget {
                line: 0,
                value: self.budget.to_string(),
            });
        }
        if self.source_airports.is_empty() {
            return Err(RequestError::NoAirports {
                line: 0,
                side: "source".to_string(),
            });
        }
        if self.destination_airports.is_empty() {
            return Err(RequestError::NoAirports {
                line: 0,
                side: "destination".to_string(),
            });
        }
        Ok(())
    }
}

pub fn load_requests(
    path: &Path,
) -> Result<Vec<Result<TravelRequest, RequestError>>, RequestError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| RequestError::IoError(e.to_string()))?;
    Ok(parse_requests(&content))
}

// Parse every block in the file. A malformed block yields an error in its
// slot; the remaining blocks are still parsed.
pub fn parse_requests(content: &str) -> Vec<Result<TravelRequest, RequestError>> {
    let mut results = Vec::new();
    let mut block: Option<BlockBuilder> = None;
    // Set after an error inside a block, so the rest of that block is skipped
    let mut skipping = false;

    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match line {
            "begin" => {
                if block.is_some() {
                    results.push(Err(RequestError::NestedBlock { line: line_no }));
                }
                skipping = false;
                block = Some(BlockBuilder::new(line_no));
            }
            "end" => {
                if let Some(builder) = block.take() {
                    results.push(builder.finish());
                } else if skipping {
                    skipping = false;
                } else {
                    results.push(Err(RequestError::UnexpectedEnd { line: line_no }));
                }
            }
            _ => {
                if skipping {
                    continue;
                }
                match block.as_mut() {
                    Some(builder) => {
                        if let Err(e) = builder.apply(line_no, line) {
                            results.push(Err(e));
                            block = None;
                            skipping = true;
                        }
                    }
                    None => results.push(Err(RequestError::OutsideBlock {
                        line: line_no,
                        content: line.to_string(),
                    })),
                }
            }
        }
    }

    if let Some(builder) = block {
        results.push(Err(RequestError::UnterminatedBlock {
            line: builder.start_line,
        }));
    }

    results
}

#[derive(Debug, Default)]
struct BlockBuilder {
    start_line: usize,
    airports: Option<(Vec<String>, Vec<String>)>,
    dates: Option<(Vec<String>, Vec<String>)>,
    budget: Option<Money>,
}

impl BlockBuilder {
    fn new(start_line: usize) -> Self {
        Self {
            start_line,
            ..Default::default()
        }
    }

    fn apply(&mut self, line: usize, content: &str) -> Result<(), RequestError> {
        if let Some(amount) = content.strip_prefix('$') {
            if self.budget.is_some() {
                return Err(RequestError::DuplicateField {
                    line,
                    field: "budget".to_string(),
                });
            }
            self.budget = Some(parse_budget(line, amount)?);
            return Ok(());
        }

        let (field, value) = content
            .split_once(':')
            .ok_or_else(|| RequestError::UnknownField {
                line,
                field: content.to_string(),
            })?;
        let field = field.trim().to_lowercase();

        match field.as_str() {
            "airports" => {
                if self.airports.is_some() {
                    return Err(RequestError::DuplicateField {
                        line,
                        field: field.clone(),
                    });
                }
                let (sources, destinations) = split_sides(line, &field, value)?;
                let sources = airport_codes(&sources);
                let destinations = airport_codes(&destinations);
                if sources.is_empty() {
                    return Err(RequestError::NoAirports {
                        line,
                        side: "source".to_string(),
                    });
                }
                if destinations.is_empty() {
                    return Err(RequestError::NoAirports {
                        line,
                        side: "destination".to_string(),
                    });
                }
                self.airports = Some((sources, destinations));
            }
            "dates" => {
                if self.dates.is_some() {
                    return Err(RequestError::DuplicateField {
                        line,
                        field: field.clone(),
                    });
                }
                let (leave, ret) = split_sides(line, &field, value)?;
                if leave.is_empty() {
                    return Err(RequestError::NoLeaveDates { line });
                }
                self.dates = Some((leave, ret));
            }
            _ => {
                return Err(RequestError::UnknownField {
                    line,
                    field: field.clone(),
                })
            }
        }

        Ok(())
    }

    fn finish(self) -> Result<TravelRequest, RequestError> {
        let missing = |field: &str| RequestError::MissingField {
            line: self.start_line,
            field: field.to_string(),
        };
        let (source_airports, destination_airports) =
            self.airports.clone().ok_or_else(|| missing("airports"))?;
        let (leave_dates, return_dates) = self.dates.clone().ok_or_else(|| missing("dates"))?;
        let budget = self.budget.ok_or_else(|| missing("budget"))?;

        Ok(TravelRequest {
            source_airports,
            destination_airports,
            leave_dates,
            return_dates,
            budget,
        })
    }
}

fn parse_budget(line: usize, amount: &str) -> Result<Money, RequestError> {
    let invalid = || RequestError::InvalidBudget {
        line,
        value: amount.to_string(),
    };
    let budget: Money = amount.trim().replace(',', "").parse().map_err(|_| invalid())?;
    if !budget.is_finite() || budget < 0.0 {
        return Err(invalid());
    }
    Ok(budget)
}

fn split_sides(
    line: usize,
    field: &str,
    value: &str,
) -> Result<(Vec<String>, Vec<String>), RequestError> {
    let (left, right) = value
        .split_once("->")
        .ok_or_else(|| RequestError::MissingArrow {
            line,
            field: field.to_string(),
        })?;
    Ok((split_list(left), split_list(right)))
}

// Comma separated, duplicates dropped, first occurrence wins
fn split_list(value: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    for item in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !items.iter().any(|existing| existing == item) {
            items.push(item.to_string());
        }
    }
    items
}

fn airport_codes(codes: &[String]) -> Vec<String> {
    let mut upper: Vec<String> = Vec::new();
    for code in codes.iter().map(|c| c.to_uppercase()) {
        if !upper.contains(&code) {
            upper.push(code);
        }
    }
    upper
}

// Sample request file shipped with the repository
pub const SAMPLE_REQUESTS_PATH: &str = "samples/flights.txt";
