//! Interactive command-line client for the order tracker.
//!
//! Reads one command per line from stdin (`create`, `cancel <uuid>`, `count`,
//! `exit`) and prints the server's answer.

use clap::Parser;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracker_types::{CancelOrderResponse, CountResponse, CreateOrderResponse, ErrorResponse};

/// Command-line arguments for the order client.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Address of the order tracker server
	#[arg(long, default_value = "127.0.0.1")]
	ip: String,

	/// Port of the order tracker server
	#[arg(long, alias = "serverPort", default_value_t = 8080)]
	server_port: u16,
}

#[derive(Debug, Error)]
enum ClientError {
	#[error("Request failed: {0}")]
	Http(#[from] reqwest::Error),
	#[error("Server returned {status}: {message}")]
	Server { status: u16, message: String },
}

/// One parsed line of user input.
#[derive(Debug, PartialEq)]
enum Command<'a> {
	Create,
	Cancel(&'a str),
	Count,
	Exit,
	Unknown,
}

impl<'a> Command<'a> {
	fn parse(line: &'a str) -> Self {
		let line = line.trim();
		match line {
			"create" => Command::Create,
			"count" => Command::Count,
			"exit" => Command::Exit,
			_ => match line.strip_prefix("cancel") {
				Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => {
					Command::Cancel(rest.trim())
				},
				_ => Command::Unknown,
			},
		}
	}
}

struct OrderClient {
	http: reqwest::Client,
	orders_url: String,
}

impl OrderClient {
	fn new(ip: &str, port: u16) -> Result<Self, ClientError> {
		let http = reqwest::Client::builder()
			.timeout(std::time::Duration::from_secs(30))
			.build()?;
		Ok(Self {
			http,
			orders_url: format!("http://{}:{}/api/orders", ip, port),
		})
	}

	async fn create(&self) -> Result<(), ClientError> {
		let response: CreateOrderResponse =
			read_json(self.http.post(&self.orders_url).send().await?).await?;
		println!("status is {}", response.status);
		println!("Order with UUID {} was created.", response.uuid);
		Ok(())
	}

	async fn cancel(&self, id: &str) -> Result<(), ClientError> {
		let url = format!("{}/{}", self.orders_url, id);
		let response: CancelOrderResponse = read_json(self.http.delete(url).send().await?).await?;
		println!("status is {}", response.status);
		if response.cancel_status == "0" {
			println!("Order {} was cancelled.", id);
		} else {
			println!("Order {} was not cancelled.", id);
		}
		Ok(())
	}

	async fn count(&self) -> Result<(), ClientError> {
		let url = format!("{}/count", self.orders_url);
		let response: CountResponse = read_json(self.http.get(url).send().await?).await?;
		println!("status is {}", response.status);
		println!(
			"Count of cancelled and existent orders is {}",
			response.total_count
		);
		Ok(())
	}
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
	let status = response.status();
	if status.is_success() {
		return Ok(response.json().await?);
	}

	let message = match response.json::<ErrorResponse>().await {
		Ok(body) => body.message,
		Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
	};
	Err(ClientError::Server {
		status: status.as_u16(),
		message,
	})
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();
	let client = OrderClient::new(&args.ip, args.server_port)?;

	println!("Welcome to Order client. Directions on communications you can send to the Order server:");
	println!("Type 'create' to create a new order.");
	println!("Type 'cancel <uuid>' to cancel an order.");
	println!("Type 'count' to receive a count of all orders (will include cancelled orders in count).");
	println!("When done, type 'exit' to exit out of the client.");

	let mut lines = BufReader::new(tokio::io::stdin()).lines();
	while let Some(line) = lines.next_line().await? {
		let result = match Command::parse(&line) {
			Command::Create => client.create().await,
			Command::Cancel("") => {
				println!("Usage: cancel <uuid>");
				Ok(())
			},
			Command::Cancel(id) => client.cancel(id).await,
			Command::Count => client.count().await,
			Command::Exit => break,
			Command::Unknown => Ok(()),
		};

		if let Err(e) = result {
			eprintln!("{}", e);
		}
	}

	Ok(())
}
