mod csr;
mod csr_export;
mod dirichlet;
