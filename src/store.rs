use serde_json::{json, Map, Value};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::book::Book;

/// Store shared by all handlers; mutations serialise on the write lock.
pub type SharedStore = Arc<RwLock<BookStore>>;

/// Ordered in-memory collection of books. Insertion order is kept and is
/// the order used for listing.
#[derive(Debug, Default, Clone)]
pub struct BookStore {
    books: Vec<Book>,
}

impl BookStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_books(books: Vec<Book>) -> Self {
        Self { books }
    }

    /// Store preloaded with the demo catalogue
    pub fn seeded() -> Self {
        let books = SEED_BOOKS
            .iter()
            .zip(1..)
            .map(|(&(title, author), id)| {
                let fields = match json!({ "title": title, "author": author }) {
                    Value::Object(map) => map,
                    _ => Map::new(),
                };
                Book::new(id, fields)
            })
            .collect();

        Self { books }
    }

    pub fn into_shared(self) -> SharedStore {
        Arc::new(RwLock::new(self))
    }

    pub fn list(&self) -> &[Book] {
        &self.books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn append(&mut self, book: Book) {
        self.books.push(book);
    }

    pub fn remove(&mut self, id: u64) -> Option<Book> {
        let index = self.books.iter().position(|book| book.id == id)?;
        Some(self.books.remove(index))
    }

    pub fn find_by_id(&self, id: u64) -> Option<&Book> {
        self.books.iter().find(|book| book.id == id)
    }

    pub fn find_by_id_mut(&mut self, id: u64) -> Option<&mut Book> {
        self.books.iter_mut().find(|book| book.id == id)
    }

    /// One past the largest id held, or 1 for an empty store
    pub fn next_id(&self) -> u64 {
        self.books.iter().map(|book| book.id).max().map_or(1, |max| max + 1)
    }

    /// Assign the next id to `fields`, append the record and return it
    pub fn insert(&mut self, fields: Map<String, Value>) -> Book {
        let book = Book::new(self.next_id(), fields);
        self.append(book.clone());
        book
    }
}

const SEED_BOOKS: [(&str, &str); 20] = [
    ("The Great Gatsby", "F. Scott Fitzgerald"),
    ("1984", "George Orwell"),
    ("To Kill a Mockingbird", "Harper Lee"),
    ("Pride and Prejudice", "Jane Austen"),
    ("The Catcher in the Rye", "J.D. Salinger"),
    ("Animal Farm", "George Orwell"),
    ("Brave New World", "Aldous Huxley"),
    ("The Hobbit", "J.R.R. Tolkien"),
    ("Moby-Dick", "Herman Melville"),
    ("War and Peace", "Leo Tolstoy"),
    ("Crime and Punishment", "Fyodor Dostoevsky"),
    ("The Odyssey", "Homer"),
    ("Jane Eyre", "Charlotte Bronte"),
    ("Wuthering Heights", "Emily Bronte"),
    ("Frankenstein", "Mary Shelley"),
    ("Dracula", "Bram Stoker"),
    ("Fahrenheit 451", "Ray Bradbury"),
    ("The Road", "Cormac McCarthy"),
    ("Beloved", "Toni Morrison"),
    ("Dune", "Frank Herbert"),
];
