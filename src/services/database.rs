use mongodb::{options::ClientOptions, Client, Collection, Database as MongoDatabase};
use tracing::info;

use crate::models::course::Course;

/// Database connection wrapper for MongoDB
///
/// Central handle for the course document store. Wraps the MongoDB client and
/// the application database instance.
#[derive(Clone)]
pub struct Database {
    /// MongoDB client instance for connection management
    pub client: Client,
    /// Specific database instance for this application
    pub database: MongoDatabase,
}

impl Database {
    /// Create a new database connection to MongoDB
    ///
    /// Parses the connection URL, tags the connection with the application
    /// name and verifies the server is reachable before returning.
    pub async fn new(database_url: &str, db_name: &str) -> Result<Self, mongodb::error::Error> {
        info!("Connecting to MongoDB: {}", database_url);

        // Parse connection string and set client options
        let mut client_options = ClientOptions::parse(database_url).await?;
        client_options.app_name = Some("coursegen-server".to_string());

        // Create client and select database
        let client = Client::with_options(client_options)?;
        let database = client.database(db_name);

        // Test the connection by listing databases
        client.list_database_names(None, None).await?;

        info!("MongoDB connection established successfully");

        Ok(Self { client, database })
    }

    /// Typed handle to the courses collection
    pub fn courses(&self) -> Collection<Course> {
        self.database.collection("courses")
    }
}
