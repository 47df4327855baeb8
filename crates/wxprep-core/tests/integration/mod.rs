mod alignment;
