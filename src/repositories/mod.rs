pub mod enquiry_repo;

pub use enquiry_repo::EnquiryRepository;
