pub mod odes;
