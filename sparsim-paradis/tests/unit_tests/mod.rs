mod atomic;
mod lock;
mod reduction;
