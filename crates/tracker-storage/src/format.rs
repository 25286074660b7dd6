//! Text layout of the record file.
//!
//! One record per line, `identifier:state`, each line terminated by `\n`.
//! No header, no escaping: identifiers are hyphenated UUIDs and states come
//! from a closed set, so neither can contain the delimiter.

use crate::StorageError;
use tracker_types::{OrderId, OrderLedger, OrderState};

pub const DELIMITER: char = ':';

/// Renders the ledger in record-file form, in ledger order.
pub fn encode(ledger: &OrderLedger) -> String {
	let mut out = String::with_capacity(ledger.len() * 48);
	for (id, state) in ledger {
		out.push_str(&id.to_string());
		out.push(DELIMITER);
		out.push_str(state.as_str());
		out.push('\n');
	}
	out
}

/// Parses record-file contents.
///
/// Accepts `\r\n` line endings and a missing final newline. Any other
/// deviation is reported with its 1-based line number and fails the whole
/// parse.
pub fn decode(contents: &str) -> Result<OrderLedger, StorageError> {
	let mut ledger = OrderLedger::new();

	for (index, line) in contents.lines().enumerate() {
		let corrupt = |reason: String| StorageError::CorruptRecord {
			line_number: index + 1,
			line: line.to_string(),
			reason,
		};

		let (id, state) = line
			.split_once(DELIMITER)
			.ok_or_else(|| corrupt(format!("expected 'identifier{}state'", DELIMITER)))?;
		let id: OrderId = id.parse().map_err(|e| corrupt(format!("{}", e)))?;
		let state: OrderState = state.parse().map_err(|e| corrupt(format!("{}", e)))?;

		if ledger.insert(id, state).is_some() {
			return Err(corrupt(format!("duplicate identifier {}", id)));
		}
	}

	Ok(ledger)
}

/// Like [`decode`] but starting from raw bytes, so that invalid UTF-8 is
/// reported as a corrupt record on the line where it occurs.
pub fn decode_bytes(bytes: &[u8]) -> Result<OrderLedger, StorageError> {
	match std::str::from_utf8(bytes) {
		Ok(contents) => decode(contents),
		Err(e) => {
			let valid = &bytes[..e.valid_up_to()];
			let line_start = valid.iter().rposition(|b| *b == b'\n').map_or(0, |p| p + 1);
			let line_end = bytes[line_start..]
				.iter()
				.position(|b| *b == b'\n')
				.map_or(bytes.len(), |p| line_start + p);

			Err(StorageError::CorruptRecord {
				line_number: valid.iter().filter(|b| **b == b'\n').count() + 1,
				line: String::from_utf8_lossy(&bytes[line_start..line_end]).into_owned(),
				reason: "invalid UTF-8".to_string(),
			})
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const A: &str = "0b9c5a7e-3f0d-4a59-9a1e-6f1d2c3b4a50";
	const B: &str = "f47ac10b-58cc-4372-a567-0e02b2c3d479";

	fn corrupt_line(result: Result<OrderLedger, StorageError>) -> (usize, String) {
		match result {
			Err(StorageError::CorruptRecord {
				line_number, line, ..
			}) => (line_number, line),
			other => panic!("expected corrupt record, got {:?}", other),
		}
	}

	#[test]
	fn test_encode_is_sorted_and_newline_terminated() {
		let mut ledger = OrderLedger::new();
		ledger.insert(B.parse().unwrap(), OrderState::Cancelled);
		ledger.insert(A.parse().unwrap(), OrderState::Created);

		assert_eq!(encode(&ledger), format!("{A}:created\n{B}:cancelled\n"));
	}

	#[test]
	fn test_encode_empty_ledger() {
		assert_eq!(encode(&OrderLedger::new()), "");
	}

	#[test]
	fn test_decode_tolerates_crlf_and_missing_final_newline() {
		let ledger = decode(&format!("{A}:created\r\n{B}:cancelled")).unwrap();

		assert_eq!(ledger.len(), 2);
		assert_eq!(ledger[&A.parse::<OrderId>().unwrap()], OrderState::Created);
		assert_eq!(ledger[&B.parse::<OrderId>().unwrap()], OrderState::Cancelled);
	}

	#[test]
	fn test_decode_reports_missing_delimiter() {
		let (line_number, line) = corrupt_line(decode(&format!("{A}:created\n{B}\n")));
		assert_eq!(line_number, 2);
		assert_eq!(line, B);
	}

	#[test]
	fn test_decode_reports_unknown_state() {
		let (line_number, line) = corrupt_line(decode(&format!("{A}:shipped\n")));
		assert_eq!(line_number, 1);
		assert_eq!(line, format!("{A}:shipped"));
	}

	#[test]
	fn test_decode_reports_empty_state() {
		let (line_number, _) = corrupt_line(decode(&format!("{A}:\n")));
		assert_eq!(line_number, 1);
	}

	#[test]
	fn test_decode_reports_bad_identifier() {
		let (line_number, line) = corrupt_line(decode(&format!("{A}:created\nnot-a-uuid:created\n")));
		assert_eq!(line_number, 2);
		assert_eq!(line, "not-a-uuid:created");
	}

	#[test]
	fn test_decode_reports_blank_line() {
		let (line_number, line) = corrupt_line(decode(&format!("{A}:created\n\n{B}:created\n")));
		assert_eq!(line_number, 2);
		assert_eq!(line, "");
	}

	#[test]
	fn test_decode_reports_duplicate_identifier() {
		let (line_number, _) = corrupt_line(decode(&format!("{A}:created\n{A}:cancelled\n")));
		assert_eq!(line_number, 2);
	}

	#[test]
	fn test_decode_bytes_reports_invalid_utf8_line() {
		let mut bytes = format!("{A}:created\n").into_bytes();
		bytes.extend_from_slice(&[0xff, 0xfe, b':', b'x', b'\n']);

		let (line_number, _) = corrupt_line(decode_bytes(&bytes));
		assert_eq!(line_number, 2);
	}
}
